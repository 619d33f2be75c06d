//! Command-line parsing for the Theil–Sen regression tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{MaxSubpopulation, Parallelism, SubsampleSize, TheilSenConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "theilsen", version, about = "Theil-Sen robust linear regression")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a CSV dataset and print coefficients, breakdown point and diagnostics.
    Fit(FitArgs),
    /// Apply a saved model JSON to the feature columns of a CSV.
    Predict(PredictArgs),
    /// Fit a synthetic contaminated problem and compare against least squares.
    Demo(DemoArgs),
    /// Print the breakdown point for a sample size and subset size.
    Breakdown(BreakdownArgs),
}

/// Estimator options shared by `fit` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct EstimatorArgs {
    /// Do not estimate an intercept.
    #[arg(long)]
    pub no_intercept: bool,

    /// Cap on the number of subsets ("unbounded" enumerates all of them).
    #[arg(long, default_value = "10000")]
    pub max_subpopulation: MaxSubpopulation,

    /// Samples per subset ("auto" = number of parameters).
    #[arg(long, default_value = "auto")]
    pub n_subsamples: SubsampleSize,

    /// Worker threads (-1 = all cores, -2 = all but one, ...).
    #[arg(long, default_value = "1", allow_negative_numbers = true)]
    pub n_jobs: Parallelism,

    /// Spatial median iteration cap.
    #[arg(long, default_value_t = 300)]
    pub max_iter: usize,

    /// Spatial median relative tolerance.
    #[arg(long, default_value_t = 1e-3)]
    pub tol: f64,

    /// Seed for subset sampling (random when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log fit progress.
    #[arg(short, long)]
    pub verbose: bool,
}

impl EstimatorArgs {
    pub fn to_config(&self) -> TheilSenConfig {
        TheilSenConfig {
            fit_intercept: !self.no_intercept,
            max_subpopulation: self.max_subpopulation,
            n_subsamples: self.n_subsamples,
            n_jobs: self.n_jobs,
            max_iter: self.max_iter,
            tol: self.tol,
            random_state: self.seed,
            verbose: self.verbose,
        }
    }
}

/// Options for fitting a CSV dataset.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input CSV with a header row.
    #[arg(long, value_name = "FILE")]
    pub csv: PathBuf,

    /// Target column name (defaults to the last column).
    #[arg(long)]
    pub target: Option<String>,

    /// Save the fitted model to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub estimator: EstimatorArgs,
}

/// Options for applying a saved model.
#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Model JSON produced by `theilsen fit --export`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// CSV containing (at least) the model's feature columns.
    #[arg(long, value_name = "FILE")]
    pub csv: PathBuf,

    /// Write features and predictions to CSV instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Options for the synthetic demo.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    #[arg(long, default_value_t = 200)]
    pub samples: usize,

    #[arg(long, default_value_t = 2)]
    pub features: usize,

    /// Fraction of targets replaced by outliers.
    #[arg(long, default_value_t = 0.2)]
    pub outlier_fraction: f64,

    /// Gaussian noise standard deviation.
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    /// Seed for the synthetic data.
    #[arg(long, default_value_t = 42)]
    pub data_seed: u64,

    #[command(flatten)]
    pub estimator: EstimatorArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct BreakdownArgs {
    #[arg(long)]
    pub samples: usize,

    #[arg(long)]
    pub subsamples: usize,
}
