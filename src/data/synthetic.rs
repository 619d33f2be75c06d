//! Synthetic contaminated linear problems.
//!
//! Features are standard normal, the target follows `y = X·w + c + noise`, and
//! a fraction of targets is then overwritten by wide outliers
//! (`outlier_scale · N(0, 1)`). Everything is driven by one seeded `StdRng`,
//! so a seed fully determines the sample.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index;
use rand_distr::Normal;

use crate::error::TheilSenError;

/// Parameters for a synthetic problem.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub n_samples: usize,
    /// True coefficients; its length sets the feature count.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Standard deviation of the Gaussian noise on `y`.
    pub noise: f64,
    /// Fraction of samples replaced by outliers, in `[0, 1)`.
    pub outlier_fraction: f64,
    pub outlier_scale: f64,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            n_samples: 100,
            coefficients: vec![5.0, 10.0],
            intercept: 1.0,
            noise: 0.1,
            outlier_fraction: 0.1,
            outlier_scale: 50.0,
            seed: 0,
        }
    }
}

/// A generated dataset together with the truth it was drawn from.
#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub coefficients: DVector<f64>,
    pub intercept: f64,
    /// Rows whose target was replaced, ascending.
    pub outliers: Vec<usize>,
}

pub fn generate_linear(spec: &SyntheticSpec) -> Result<SyntheticData, TheilSenError> {
    if spec.n_samples == 0 {
        return Err(TheilSenError::invalid("Sample count must be > 0."));
    }
    if spec.coefficients.is_empty() {
        return Err(TheilSenError::invalid("At least one coefficient is required."));
    }
    if !(spec.outlier_fraction.is_finite() && (0.0..1.0).contains(&spec.outlier_fraction)) {
        return Err(TheilSenError::invalid(format!(
            "Outlier fraction must be in [0, 1), got {}",
            spec.outlier_fraction
        )));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(TheilSenError::invalid("Noise level must be finite and >= 0."));
    }
    if !(spec.outlier_scale.is_finite() && spec.outlier_scale >= 0.0) {
        return Err(TheilSenError::invalid("Outlier scale must be finite and >= 0."));
    }

    let n = spec.n_samples;
    let p = spec.coefficients.len();
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| TheilSenError::invalid(format!("Noise distribution error: {e}")))?;

    let x = DMatrix::from_fn(n, p, |_, _| standard.sample(&mut rng));
    let w = DVector::from_column_slice(&spec.coefficients);
    let mut y = (&x * &w).add_scalar(spec.intercept);
    for v in y.iter_mut() {
        *v += spec.noise * standard.sample(&mut rng);
    }

    let n_outliers = (spec.outlier_fraction * n as f64).round() as usize;
    let mut outliers = index::sample(&mut rng, n, n_outliers).into_vec();
    outliers.sort_unstable();
    for &i in &outliers {
        y[i] = spec.outlier_scale * standard.sample(&mut rng);
    }

    Ok(SyntheticData {
        x,
        y,
        coefficients: w,
        intercept: spec.intercept,
        outliers,
    })
}
