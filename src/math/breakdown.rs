//! Breakdown point of the subpopulation estimator.
//!
//! A candidate slope is only trustworthy when its whole subset is clean. With
//! outlier fraction `ε`, a subset of size `k` is clean with probability
//! `(1 − ε)^k`; the spatial median breaks down once fewer than half of the
//! candidates are clean, i.e. at `ε = 1 − 0.5^(1/k)` for large `n`.
//!
//! For finite `n` the bound is corrected to:
//!
//! ```text
//! 1 − (0.5^(1/k) · (n − k + 1) + k − 1) / n
//! ```
//!
//! which equals the large-sample limit as `n → ∞`.

use crate::error::TheilSenError;

/// Fraction of arbitrary outliers tolerated for `(n_samples, n_subsamples)`.
pub fn breakdown_point(n_samples: usize, n_subsamples: usize) -> Result<f64, TheilSenError> {
    if n_subsamples == 0 {
        return Err(TheilSenError::invalid("n_subsamples must be >= 1"));
    }
    if n_samples < n_subsamples {
        return Err(TheilSenError::invalid(format!(
            "n_samples ({n_samples}) must be >= n_subsamples ({n_subsamples})"
        )));
    }

    let n = n_samples as f64;
    let k = n_subsamples as f64;
    let clean_root = 0.5_f64.powf(1.0 / k);
    Ok(1.0 - (clean_root * (n - k + 1.0) + k - 1.0) / n)
}
