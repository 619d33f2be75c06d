//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use nalgebra::DVector;

use crate::data::SyntheticData;
use crate::domain::FitPath;
use crate::fit::TheilSenFit;
use crate::io::ingest::RowError;
use crate::report::{rank_largest_residuals, summarize_residuals};

/// Format the fit summary: coefficients, intercept, breakdown and diagnostics.
pub fn format_fit_summary(
    fit: &TheilSenFit,
    feature_names: &[String],
    target_name: &str,
    residuals: &DVector<f64>,
) -> String {
    let diag = fit.diagnostics();
    let mut out = String::new();

    out.push_str("=== theilsen - Theil-Sen robust regression ===\n");
    out.push_str(&format!(
        "Data: n={} | features={} | target={}\n",
        diag.n_samples, diag.n_features, target_name
    ));
    let path = match diag.path {
        FitPath::Subpopulations => format!(
            "spatial median of {} {} subsets of size {}",
            diag.n_subpopulation,
            if diag.exhaustive { "exhaustive" } else { "sampled" },
            diag.n_subsamples
        ),
        FitPath::LeastSquares => "least squares (fewer samples than parameters)".to_string(),
    };
    out.push_str(&format!("Path: {path}\n"));
    out.push_str(&format!(
        "Workers: {} | median iterations: {}{}\n",
        diag.n_workers,
        diag.median_iterations,
        if diag.median_converged { "" } else { " (not converged)" }
    ));
    out.push_str(&format!(
        "Breakdown point: {:.4} (tolerates ~{} outliers)\n",
        fit.breakdown_point(),
        (fit.breakdown_point() * diag.n_samples as f64).ceil() as usize
    ));

    out.push_str("\nCoefficients:\n");
    for (name, c) in feature_names.iter().zip(fit.coefficients().iter()) {
        out.push_str(&format!("  {:<20} {c:>14.6}\n", truncate(name, 20)));
    }
    out.push_str(&format!("  {:<20} {:>14.6}\n", "(intercept)", fit.intercept()));

    if let Some(s) = summarize_residuals(residuals) {
        out.push_str("\nResiduals:\n");
        out.push_str(&format!(
            "  min={:.4} median={:.4} max={:.4} MAD={:.4}\n",
            s.min, s.median, s.max, s.mad
        ));
        out.push_str("  largest |residual|:\n");
        for r in rank_largest_residuals(residuals, 5) {
            out.push_str(&format!("    row {:>6} {:>14.4}\n", r.row, r.residual));
        }
    }

    out
}

/// List skipped CSV rows, at most `max_shown` of them.
pub fn format_row_errors(errors: &[RowError], max_shown: usize) -> String {
    let mut out = String::new();
    if errors.is_empty() {
        return out;
    }
    out.push_str(&format!("Skipped {} row(s):\n", errors.len()));
    for e in errors.iter().take(max_shown) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if errors.len() > max_shown {
        out.push_str(&format!("  ... {} more\n", errors.len() - max_shown));
    }
    out
}

/// Truth vs Theil–Sen vs OLS on a synthetic problem.
pub fn format_demo_comparison(
    data: &SyntheticData,
    fit: &TheilSenFit,
    ols_coef: &DVector<f64>,
    ols_intercept: f64,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Synthetic problem: n={} | features={} | outliers={}\n\n",
        data.y.len(),
        data.coefficients.len(),
        data.outliers.len()
    ));

    out.push_str(format!("{:<12} {:>12} {:>12} {:>12}\n", "param", "truth", "theil-sen", "ols").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<12} {:-<12} {:-<12}\n", "", "", "", "").trim_end());
    out.push('\n');

    for (j, truth) in data.coefficients.iter().enumerate() {
        out.push_str(&format!(
            "{:<12} {truth:>12.4} {:>12.4} {:>12.4}\n",
            format!("w{j}"),
            fit.coefficients()[j],
            ols_coef[j]
        ));
    }
    out.push_str(&format!(
        "{:<12} {:>12.4} {:>12.4} {:>12.4}\n",
        "intercept",
        data.intercept,
        fit.intercept(),
        ols_intercept
    ));

    let ts_err = (fit.coefficients() - &data.coefficients).norm();
    let ols_err = (ols_coef - &data.coefficients).norm();
    out.push_str(&format!(
        "\n|w - truth|: theil-sen={ts_err:.4} ols={ols_err:.4}\n"
    ));
    out.push_str(&format!("Breakdown point: {:.4}\n", fit.breakdown_point()));
    out
}

pub fn format_breakdown(n_samples: usize, n_subsamples: usize, value: f64) -> String {
    format!(
        "Breakdown point for n_samples={n_samples}, n_subsamples={n_subsamples}: {value:.6} \
         (tolerates ~{} outliers)\n",
        (value * n_samples as f64).ceil() as usize
    )
}

/// One prediction per line.
pub fn format_predictions(predictions: &DVector<f64>) -> String {
    let mut out = String::with_capacity(predictions.len() * 16);
    for p in predictions.iter() {
        out.push_str(&format!("{p:.6}\n"));
    }
    out
}

pub fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
