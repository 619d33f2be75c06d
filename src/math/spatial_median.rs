//! Spatial median (Fermat–Weber point) via the modified Weiszfeld iteration.
//!
//! The classic Weiszfeld step replaces the estimate `y` by the average of
//! the points weighted with `1 / ‖p_i − y‖`. That weight is undefined when
//! `y` lands on an input point, which happens often with few candidates.
//!
//! The modified step (Vardi & Zhang) drops the coincident points from the
//! average and damps the move by their count `η`:
//!
//! ```text
//! T = Σ_{d_i>0} (p_i − y) / d_i          r = ‖T‖
//! y' = y + max(0, 1 − η/r) · T / Σ_{d_i>0} 1/d_i
//! ```
//!
//! When `r ≤ η` the current point already is the spatial median and the
//! iteration stops there instead of oscillating around it.

use log::warn;
use nalgebra::{DMatrix, DVector};

use crate::error::TheilSenError;

/// Distances below this are treated as "the estimate sits on this point".
const COINCIDENCE_EPS: f64 = 1e-10;

/// Absolute step floor for estimates whose norm is (near) zero.
const STEP_FLOOR: f64 = 1e-12;

/// Result of a spatial median computation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialMedian {
    pub median: DVector<f64>,
    /// Number of Weiszfeld steps taken.
    pub n_iter: usize,
    /// `false` when `max_iter` was exhausted before reaching `tol`.
    pub converged: bool,
}

/// Compute the spatial median of the rows of `points`.
///
/// Iteration starts at the coordinate-wise mean and stops once
/// `‖y' − y‖ ≤ tol · ‖y‖`. Running out of iterations is not an error: the
/// last iterate is returned with `converged = false` and a warning is logged.
pub fn spatial_median(
    points: &DMatrix<f64>,
    max_iter: usize,
    tol: f64,
) -> Result<SpatialMedian, TheilSenError> {
    let (n, dim) = points.shape();
    if n == 0 || dim == 0 {
        return Err(TheilSenError::invalid(
            "spatial median requires at least one point with one coordinate",
        ));
    }
    if !(tol.is_finite() && tol >= 0.0) {
        return Err(TheilSenError::invalid(format!(
            "tol must be finite and >= 0, got {tol}"
        )));
    }

    if n == 1 {
        return Ok(SpatialMedian {
            median: points.row(0).transpose(),
            n_iter: 0,
            converged: true,
        });
    }

    // In one dimension the spatial median is the ordinary median.
    if dim == 1 {
        let mut values: Vec<f64> = points.column(0).iter().copied().collect();
        let m = median_mut(&mut values).unwrap_or(0.0);
        return Ok(SpatialMedian {
            median: DVector::from_element(1, m),
            n_iter: 0,
            converged: true,
        });
    }

    let mut current = points.row_mean().transpose();

    for iter in 1..=max_iter {
        let next = modified_weiszfeld_step(points, &current);
        let step = (&next - &current).norm();
        let scale = current.norm();
        current = next;

        if step <= tol * scale || step <= STEP_FLOOR {
            return Ok(SpatialMedian {
                median: current,
                n_iter: iter,
                converged: true,
            });
        }
    }

    warn!(
        "Spatial median did not converge within {max_iter} iterations (tol={tol}); \
         using the last iterate."
    );
    Ok(SpatialMedian {
        median: current,
        n_iter: max_iter,
        converged: false,
    })
}

/// One modified Weiszfeld step from `current`.
///
/// # Panics
/// Panics if `current` does not have `points.ncols()` entries.
pub fn modified_weiszfeld_step(points: &DMatrix<f64>, current: &DVector<f64>) -> DVector<f64> {
    let (n, dim) = points.shape();
    assert_eq!(current.len(), dim, "estimate/point dimension mismatch");

    let mut weighted_sum = DVector::<f64>::zeros(dim);
    let mut direction = DVector::<f64>::zeros(dim);
    let mut inv_dist_sum = 0.0;
    let mut coincident = 0usize;

    for i in 0..n {
        let mut dist_sq = 0.0;
        for j in 0..dim {
            let d = points[(i, j)] - current[j];
            dist_sq += d * d;
        }
        let dist = dist_sq.sqrt();
        if dist < COINCIDENCE_EPS {
            coincident += 1;
            continue;
        }

        let inv = 1.0 / dist;
        inv_dist_sum += inv;
        for j in 0..dim {
            weighted_sum[j] += points[(i, j)] * inv;
            direction[j] += (points[(i, j)] - current[j]) * inv;
        }
    }

    if coincident == 0 {
        return weighted_sum / inv_dist_sum;
    }

    let r = direction.norm();
    let eta = coincident as f64;
    if r < COINCIDENCE_EPS || r <= eta {
        return current.clone();
    }

    current + direction * ((1.0 - eta / r) / inv_dist_sum)
}

/// Ordinary median; sorts `values` in place.
pub fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn line() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0])
    }

    #[test]
    fn step_1d_keeps_the_median_fixed() {
        let y = DVector::from_element(1, 2.0);
        let next = modified_weiszfeld_step(&line(), &y);
        assert_abs_diff_eq!(next[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn step_1d_moves_toward_the_median() {
        for start in [2.5, 3.0] {
            let y = DVector::from_element(1, start);
            let next = modified_weiszfeld_step(&line(), &y);
            assert!(
                next[0] > 2.0 && next[0] < start,
                "step from {start} landed at {}",
                next[0]
            );
        }
    }

    #[test]
    fn step_on_single_point_is_identity() {
        let points = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(modified_weiszfeld_step(&points, &y), y);
    }

    #[test]
    fn step_2d_matches_reference_iterates() {
        let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 1.0, 0.0, 1.0]);

        let y = DVector::from_row_slice(&[0.5, 0.5]);
        let y1 = modified_weiszfeld_step(&points, &y);
        assert_abs_diff_eq!(y1[0], 1.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y1[1], 2.0 / 3.0, epsilon = 1e-6);

        let y2 = modified_weiszfeld_step(&points, &y1);
        assert_abs_diff_eq!(y2[0], 0.2792408, epsilon = 1e-6);
        assert_abs_diff_eq!(y2[1], 0.7207592, epsilon = 1e-6);

        let fixed = DVector::from_row_slice(&[0.21132505, 0.78867497]);
        let next = modified_weiszfeld_step(&points, &fixed);
        assert_abs_diff_eq!(next[0], fixed[0], epsilon = 1e-6);
        assert_abs_diff_eq!(next[1], fixed[1], epsilon = 1e-6);
    }

    #[test]
    fn median_of_collinear_points_is_middle_point() {
        let m = spatial_median(&line(), 300, 1e-3).unwrap();
        assert_eq!(m.median[0], 2.0);
        assert!(m.converged);

        let m = spatial_median(&line(), 30, 0.0).unwrap();
        assert_eq!(m.median[0], 2.0);
    }

    #[test]
    fn median_matches_fermat_weber_point() {
        let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let m = spatial_median(&points, 1000, 1e-12).unwrap();

        // Symmetric about x = y; minimizing the distance sum along that line
        // gives 6t² − 6t + 1 = 0.
        let t = 0.5 - 3.0_f64.sqrt() / 6.0;
        assert!(m.converged);
        assert_abs_diff_eq!(m.median[0], t, epsilon = 1e-6);
        assert_abs_diff_eq!(m.median[1], t, epsilon = 1e-6);
    }

    #[test]
    fn median_with_default_tolerance_is_close() {
        let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let m = spatial_median(&points, 100, 1e-6).unwrap();
        let t = 0.5 - 3.0_f64.sqrt() / 6.0;
        assert_abs_diff_eq!(m.median[0], t, epsilon = 1e-6);
        assert_abs_diff_eq!(m.median[1], t, epsilon = 1e-6);
    }

    #[test]
    fn median_is_translation_equivariant() {
        let points = DMatrix::from_row_slice(
            5,
            2,
            &[0.0, 0.0, 4.0, 1.0, 1.0, 3.0, -2.0, 2.0, 3.0, -1.0],
        );
        let shift = DVector::from_row_slice(&[10.0, -7.5]);
        let mut shifted = points.clone();
        for mut row in shifted.row_iter_mut() {
            row += shift.transpose();
        }

        let base = spatial_median(&points, 10_000, 1e-12).unwrap();
        let moved = spatial_median(&shifted, 10_000, 1e-12).unwrap();
        let expected = &base.median + &shift;
        for j in 0..2 {
            assert_abs_diff_eq!(moved.median[j], expected[j], epsilon = 1e-6);
        }
    }

    #[test]
    fn single_point_is_returned_unchanged() {
        let points = DMatrix::from_row_slice(1, 2, &[3.5, -1.0]);
        let m = spatial_median(&points, 10, 1e-3).unwrap();
        assert_eq!(m.median, DVector::from_row_slice(&[3.5, -1.0]));
        assert_eq!(m.n_iter, 0);
    }

    #[test]
    fn median_on_a_data_point_is_found() {
        // Four points around a center point: the center is the median and
        // also the starting mean.
        let points = DMatrix::from_row_slice(
            5,
            2,
            &[0.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.0, -1.0],
        );
        let m = spatial_median(&points, 50, 1e-6).unwrap();
        assert!(m.converged);
        assert_abs_diff_eq!(m.median[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.median[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn exhausted_iterations_return_last_iterate() {
        let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let m = spatial_median(&points, 2, 0.0).unwrap();
        assert!(!m.converged);
        assert_eq!(m.n_iter, 2);
        assert!(m.median.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_input_is_rejected() {
        let points = DMatrix::<f64>::zeros(0, 2);
        assert!(spatial_median(&points, 10, 1e-3).is_err());
    }
}
