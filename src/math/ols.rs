//! Least-squares primitive.
//!
//! Every candidate slope in the estimator comes from a small problem of the
//! form:
//!
//! ```text
//! minimize ‖X_sub w − y_sub‖²
//! ```
//!
//! Implementation choices:
//! - We solve through an SVD so the same code handles square, tall and wide
//!   systems. (Nalgebra's `QR::solve` is intended for square systems and will
//!   panic for non-square matrices.)
//! - Singular values below `σ_max · max(rows, cols) · ε` are treated as zero,
//!   which yields the Moore–Penrose (minimum-norm) solution for rank-deficient
//!   subsets instead of an error.

use nalgebra::{DMatrix, DVector};

use crate::error::TheilSenError;

/// Solve a least squares problem using SVD (minimum-norm solution).
pub fn solve_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
) -> Result<DVector<f64>, TheilSenError> {
    if x.nrows() != y.len() {
        return Err(TheilSenError::DimensionMismatch {
            what: "least-squares right-hand side",
            expected: x.nrows(),
            got: y.len(),
        });
    }

    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = sigma_max * (x.nrows().max(x.ncols()) as f64) * f64::EPSILON;

    let w = svd
        .solve(y, cutoff)
        .map_err(|e| TheilSenError::Solver(e.to_string()))?;

    if w.iter().all(|v| v.is_finite()) {
        Ok(w)
    } else {
        Err(TheilSenError::Solver(
            "non-finite coefficients in least-squares solution".to_string(),
        ))
    }
}

/// Prepend a column of ones so the first solved weight is the intercept.
pub fn with_intercept_column(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.clone().insert_column(0, 1.0)
}

/// Ordinary least squares on the full dataset.
///
/// Returns `(coefficients, intercept)`; the intercept is `0.0` when
/// `fit_intercept` is false. Used as the reference fit in reports and as the
/// fallback for datasets with more features than samples.
pub fn ordinary_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    fit_intercept: bool,
) -> Result<(DVector<f64>, f64), TheilSenError> {
    if fit_intercept {
        let w = solve_least_squares(&with_intercept_column(x), y)?;
        let coef = w.rows(1, w.len() - 1).into_owned();
        Ok((coef, w[0]))
    } else {
        Ok((solve_least_squares(x, y)?, 0.0))
    }
}
