//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the logger
//! - runs the requested subcommand
//! - prints reports and writes optional exports

use clap::Parser;
use log::LevelFilter;

use crate::cli::{BreakdownArgs, Cli, Command, DemoArgs, FitArgs, PredictArgs};
use crate::data::SyntheticSpec;
use crate::error::TheilSenError;
use crate::io::export::{
    fit_from_model_file, read_model_json, to_model_file, write_model_json, write_predictions_csv,
};
use crate::io::ingest::load_features;
use crate::math::breakdown_point;
use crate::report;

pub mod pipeline;

/// Entry point for the `theilsen` binary.
pub fn run() -> Result<(), TheilSenError> {
    let cli = Cli::parse();
    init_logging(verbose(&cli.command));

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Predict(args) => handle_predict(args),
        Command::Demo(args) => handle_demo(args),
        Command::Breakdown(args) => handle_breakdown(args),
    }
}

fn verbose(command: &Command) -> bool {
    match command {
        Command::Fit(args) => args.estimator.verbose,
        Command::Demo(args) => args.estimator.verbose,
        Command::Predict(_) | Command::Breakdown(_) => false,
    }
}

/// `warn` by default, `info` with `--verbose`; `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), TheilSenError> {
    let config = args.estimator.to_config();
    let run = pipeline::run_fit(&args.csv, args.target.as_deref(), &config)?;

    let skipped = report::format_row_errors(&run.dataset.row_errors, 10);
    if !skipped.is_empty() {
        eprint!("{skipped}");
    }
    println!(
        "{}",
        report::format_fit_summary(
            &run.fit,
            &run.dataset.feature_names,
            &run.dataset.target_name,
            &run.residuals,
        )
    );

    if let Some(path) = &args.export {
        let model = to_model_file(
            &run.fit,
            &run.dataset.feature_names,
            &run.dataset.target_name,
            &config,
        );
        write_model_json(path, &model)?;
        log::info!("Model written to {}", path.display());
    }

    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), TheilSenError> {
    let model = read_model_json(&args.model)?;
    let fit = fit_from_model_file(&model)?;
    let (x, row_errors) = load_features(&args.csv, &model.feature_names)?;

    let skipped = report::format_row_errors(&row_errors, 10);
    if !skipped.is_empty() {
        eprint!("{skipped}");
    }

    let predictions = fit.predict(&x)?;
    match &args.output {
        Some(path) => write_predictions_csv(path, &model.feature_names, &x, &predictions)?,
        None => print!("{}", report::format_predictions(&predictions)),
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), TheilSenError> {
    if args.features == 0 {
        return Err(TheilSenError::invalid("--features must be >= 1"));
    }
    // Coefficients 1, 2, ..., p so every feature has a distinct slope.
    let spec = SyntheticSpec {
        n_samples: args.samples,
        coefficients: (1..=args.features).map(|j| j as f64).collect(),
        intercept: 1.0,
        noise: args.noise,
        outlier_fraction: args.outlier_fraction,
        seed: args.data_seed,
        ..SyntheticSpec::default()
    };
    let config = args.estimator.to_config();
    let run = pipeline::run_demo(&spec, &config)?;
    log::debug!("Theil-Sen coefficients: {}", report::fmt_vec(run.fit.coefficients().as_slice()));

    println!(
        "{}",
        report::format_demo_comparison(&run.data, &run.fit, &run.ols_coef, run.ols_intercept)
    );
    Ok(())
}

fn handle_breakdown(args: BreakdownArgs) -> Result<(), TheilSenError> {
    let value = breakdown_point(args.samples, args.subsamples)?;
    print!("{}", report::format_breakdown(args.samples, args.subsamples, value));
    Ok(())
}
