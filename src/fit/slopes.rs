//! Per-subset slope estimation.
//!
//! Each subset yields one candidate coefficient vector by least squares on
//! its rows. With an intercept, a column of ones takes part in the solve (the
//! reserved degree of freedom) and its weight is dropped afterwards; the
//! intercept itself is estimated later from the residuals of the aggregate.

use nalgebra::{DMatrix, DVector};

use crate::error::TheilSenError;
use crate::math::{solve_least_squares, with_intercept_column};

/// Slope vector (length `n_features`) for one subset of rows.
pub fn estimate(
    x_subset: &DMatrix<f64>,
    y_subset: &DVector<f64>,
    fit_intercept: bool,
) -> Result<DVector<f64>, TheilSenError> {
    if fit_intercept {
        let w = solve_least_squares(&with_intercept_column(x_subset), y_subset)?;
        Ok(w.rows(1, w.len() - 1).into_owned())
    } else {
        solve_least_squares(x_subset, y_subset)
    }
}

/// Worker body: one slope row per subset, flattened row-major, in order.
pub fn estimate_batch(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    subsets: &[Vec<usize>],
    fit_intercept: bool,
) -> Result<Vec<f64>, TheilSenError> {
    let mut out = Vec::with_capacity(subsets.len() * x.ncols());
    for subset in subsets {
        let x_sub = x.select_rows(subset.iter());
        let y_sub = y.select_rows(subset.iter());
        let w = estimate(&x_sub, &y_sub, fit_intercept)?;
        out.extend(w.iter().copied());
    }
    Ok(out)
}
