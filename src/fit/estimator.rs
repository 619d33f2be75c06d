//! Theil–Sen fit driver.
//!
//! Stages of a fit:
//!
//! 1. validate shapes and configuration (fails before any work)
//! 2. draw or enumerate subsets
//! 3. estimate one slope per subset on a worker pool (parallel)
//! 4. reassemble slopes in subset order and take their spatial median
//! 5. intercept = median of the residuals `y − X·coef`
//!
//! Datasets with more parameters than samples cannot form meaningful subsets;
//! they take a direct least-squares path instead (recorded in the
//! diagnostics as `FitPath::LeastSquares`).

use std::fmt;

use log::Level;
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::{FitDiagnostics, FitPath, MaxSubpopulation, TheilSenConfig};
use crate::error::TheilSenError;
use crate::fit::slopes::estimate_batch;
use crate::fit::splitter::split;
use crate::fit::subsets::{generate_subsets, resolve_subsample_size};
use crate::math::{breakdown_point, median_mut, ordinary_least_squares, spatial_median};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FitStage {
    Validating,
    Sampling,
    Estimating,
    Aggregating,
    Fitted,
}

impl fmt::Display for FitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FitStage::Validating => "validating",
            FitStage::Sampling => "sampling",
            FitStage::Estimating => "estimating",
            FitStage::Aggregating => "aggregating",
            FitStage::Fitted => "fitted",
        };
        f.write_str(name)
    }
}

/// Robust multivariate linear regression estimator.
#[derive(Debug, Clone, Default)]
pub struct TheilSen {
    config: TheilSenConfig,
}

/// A fitted Theil–Sen model.
#[derive(Debug, Clone, PartialEq)]
pub struct TheilSenFit {
    coef: DVector<f64>,
    intercept: f64,
    breakdown: f64,
    diagnostics: FitDiagnostics,
}

impl TheilSen {
    pub fn new(config: TheilSenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TheilSenConfig {
        &self.config
    }

    /// Fit coefficients and intercept to `(x, y)`.
    pub fn fit(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<TheilSenFit, TheilSenError> {
        let cfg = &self.config;
        self.stage(FitStage::Validating);
        validate_inputs(x, y)?;
        validate_config(cfg)?;

        let (n_samples, n_features) = x.shape();
        let n_dim = n_features + usize::from(cfg.fit_intercept);
        let n_subsamples =
            resolve_subsample_size(cfg.n_subsamples, n_samples, n_features, cfg.fit_intercept)?;
        let n_workers = cfg.n_jobs.resolve_here()?;
        let breakdown = breakdown_point(n_samples, n_subsamples)?;

        if n_samples < n_dim {
            return self.fit_least_squares(x, y, n_subsamples, n_workers, breakdown);
        }

        self.progress(format_args!("Breakdown point: {breakdown}"));
        self.progress(format_args!("Number of samples: {n_samples}"));
        self.progress(format_args!(
            "Tolerable outliers: {}",
            (breakdown * n_samples as f64).ceil() as usize
        ));

        self.stage(FitStage::Sampling);
        let mut rng = match cfg.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let subsets = generate_subsets(n_samples, n_subsamples, cfg.max_subpopulation, &mut rng)?;
        self.progress(format_args!(
            "Number of subpopulations: {} ({})",
            subsets.len(),
            if subsets.exhaustive { "exhaustive" } else { "sampled" }
        ));

        self.stage(FitStage::Estimating);
        let work = split(&subsets.indices, n_workers)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .build()
            .map_err(|e| TheilSenError::Parallel(e.to_string()))?;
        let fit_intercept = cfg.fit_intercept;
        let parts: Vec<Vec<f64>> = pool.install(|| {
            work.partitions()
                .par_iter()
                .map(|chunk| estimate_batch(x, y, chunk, fit_intercept))
                .collect::<Result<Vec<_>, _>>()
        })?;

        self.stage(FitStage::Aggregating);
        let flat = work.reassemble(parts, n_features)?;
        let candidates = DMatrix::from_row_slice(subsets.len(), n_features, &flat);
        let median = spatial_median(&candidates, cfg.max_iter, cfg.tol)?;
        let coef = median.median;
        let intercept = if cfg.fit_intercept {
            residual_median(x, y, &coef)
        } else {
            0.0
        };

        self.stage(FitStage::Fitted);
        Ok(TheilSenFit {
            coef,
            intercept,
            breakdown,
            diagnostics: FitDiagnostics {
                path: FitPath::Subpopulations,
                n_samples,
                n_features,
                n_subsamples,
                n_subpopulation: subsets.len(),
                exhaustive: subsets.exhaustive,
                n_workers,
                median_iterations: median.n_iter,
                median_converged: median.converged,
            },
        })
    }

    fn fit_least_squares(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        n_subsamples: usize,
        n_workers: usize,
        breakdown: f64,
    ) -> Result<TheilSenFit, TheilSenError> {
        let (n_samples, n_features) = x.shape();
        log::info!(
            "More parameters than samples (n_samples={n_samples}, n_features={n_features}); \
             falling back to least squares on all rows."
        );

        let (coef, _) = ordinary_least_squares(x, y, self.config.fit_intercept)?;
        let intercept = if self.config.fit_intercept {
            residual_median(x, y, &coef)
        } else {
            0.0
        };

        self.stage(FitStage::Fitted);
        Ok(TheilSenFit {
            coef,
            intercept,
            breakdown,
            diagnostics: FitDiagnostics {
                path: FitPath::LeastSquares,
                n_samples,
                n_features,
                n_subsamples,
                n_subpopulation: 1,
                exhaustive: true,
                n_workers,
                median_iterations: 0,
                median_converged: true,
            },
        })
    }

    fn progress(&self, args: fmt::Arguments<'_>) {
        let level = if self.config.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        log::log!(level, "{args}");
    }

    fn stage(&self, stage: FitStage) {
        log::debug!("Theil-Sen fit: {stage}");
    }
}

impl TheilSenFit {
    /// Rebuild a fitted model from stored parameters.
    pub fn from_parts(
        coef: DVector<f64>,
        intercept: f64,
        breakdown: f64,
        diagnostics: FitDiagnostics,
    ) -> Self {
        Self {
            coef,
            intercept,
            breakdown,
            diagnostics,
        }
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Fraction of outliers the fitted configuration tolerates.
    pub fn breakdown_point(&self) -> f64 {
        self.breakdown
    }

    pub fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    /// `X·coef + intercept`.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, TheilSenError> {
        if x.ncols() != self.coef.len() {
            return Err(TheilSenError::DimensionMismatch {
                what: "prediction features",
                expected: self.coef.len(),
                got: x.ncols(),
            });
        }
        Ok((x * &self.coef).add_scalar(self.intercept))
    }

    /// `y − predict(x)`.
    pub fn residuals(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>, TheilSenError> {
        if x.nrows() != y.len() {
            return Err(TheilSenError::DimensionMismatch {
                what: "target length",
                expected: x.nrows(),
                got: y.len(),
            });
        }
        Ok(y - self.predict(x)?)
    }
}

fn residual_median(x: &DMatrix<f64>, y: &DVector<f64>, coef: &DVector<f64>) -> f64 {
    let mut residuals: Vec<f64> = (y - x * coef).iter().copied().collect();
    median_mut(&mut residuals).unwrap_or(0.0)
}

fn validate_inputs(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), TheilSenError> {
    if x.nrows() == 0 {
        return Err(TheilSenError::invalid("X has no samples"));
    }
    if x.ncols() == 0 {
        return Err(TheilSenError::invalid("X has no features"));
    }
    if y.len() != x.nrows() {
        return Err(TheilSenError::DimensionMismatch {
            what: "target length",
            expected: x.nrows(),
            got: y.len(),
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(TheilSenError::invalid("X and y must contain only finite values"));
    }
    Ok(())
}

fn validate_config(cfg: &TheilSenConfig) -> Result<(), TheilSenError> {
    if cfg.max_iter == 0 {
        return Err(TheilSenError::invalid("max_iter must be >= 1"));
    }
    if cfg.max_subpopulation == MaxSubpopulation::Limit(0) {
        return Err(TheilSenError::invalid("max_subpopulation must be >= 1, got 0"));
    }
    if !(cfg.tol.is_finite() && cfg.tol >= 0.0) {
        return Err(TheilSenError::invalid(format!(
            "tol must be finite and >= 0, got {}",
            cfg.tol
        )));
    }
    Ok(())
}
