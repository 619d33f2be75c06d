//! Shared fit workflows used by the CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest/generate -> fit -> residuals (-> least-squares baseline)
//!
//! The subcommand handlers can then focus on presentation and exports.

use std::path::Path;

use nalgebra::DVector;

use crate::data::{SyntheticData, SyntheticSpec, generate_linear};
use crate::domain::TheilSenConfig;
use crate::error::TheilSenError;
use crate::fit::{TheilSen, TheilSenFit};
use crate::io::ingest::{Dataset, load_dataset};
use crate::math::ordinary_least_squares;

/// All computed outputs of a single `theilsen fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub dataset: Dataset,
    pub fit: TheilSenFit,
    pub residuals: DVector<f64>,
}

/// Outputs of a `theilsen demo` run.
#[derive(Debug, Clone)]
pub struct DemoRun {
    pub data: SyntheticData,
    pub fit: TheilSenFit,
    pub ols_coef: DVector<f64>,
    pub ols_intercept: f64,
}

/// Load a CSV and fit it.
pub fn run_fit(path: &Path, target: Option<&str>, config: &TheilSenConfig) -> Result<FitRun, TheilSenError> {
    let dataset = load_dataset(path, target)?;
    fit_dataset(dataset, config)
}

/// Fit an already ingested dataset.
pub fn fit_dataset(dataset: Dataset, config: &TheilSenConfig) -> Result<FitRun, TheilSenError> {
    log::info!(
        "Ingested {} of {} rows ({} features, target '{}')",
        dataset.rows_used(),
        dataset.rows_read,
        dataset.feature_names.len(),
        dataset.target_name
    );
    for e in &dataset.row_errors {
        log::debug!("Skipped line {}: {}", e.line, e.message);
    }

    let fit = TheilSen::new(config.clone()).fit(&dataset.x, &dataset.y)?;
    let residuals = fit.residuals(&dataset.x, &dataset.y)?;
    Ok(FitRun {
        dataset,
        fit,
        residuals,
    })
}

/// Generate a synthetic problem and fit it with Theil–Sen and least squares.
pub fn run_demo(spec: &SyntheticSpec, config: &TheilSenConfig) -> Result<DemoRun, TheilSenError> {
    let data = generate_linear(spec)?;
    let fit = TheilSen::new(config.clone()).fit(&data.x, &data.y)?;
    let (ols_coef, ols_intercept) = ordinary_least_squares(&data.x, &data.y, config.fit_intercept)?;
    Ok(DemoRun {
        data,
        fit,
        ols_coef,
        ols_intercept,
    })
}
