//! Reporting utilities: residual statistics and rankings.

pub mod format;

pub use format::*;

use nalgebra::DVector;

use crate::math::median_mut;

/// Robust summary of a residual vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualSummary {
    pub n: usize,
    pub min: f64,
    pub median: f64,
    pub max: f64,
    /// Median absolute deviation from the median.
    pub mad: f64,
}

/// One row of a residual ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedResidual {
    pub row: usize,
    pub residual: f64,
}

/// Returns `None` for an empty vector.
pub fn summarize_residuals(residuals: &DVector<f64>) -> Option<ResidualSummary> {
    let mut values: Vec<f64> = residuals.iter().copied().collect();
    let median = median_mut(&mut values)?;
    let mut deviations: Vec<f64> = values.iter().map(|r| (r - median).abs()).collect();
    let mad = median_mut(&mut deviations)?;
    Some(ResidualSummary {
        n: values.len(),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        median,
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mad,
    })
}

/// Rows with the largest absolute residuals, largest first.
pub fn rank_largest_residuals(residuals: &DVector<f64>, top_n: usize) -> Vec<RankedResidual> {
    let mut ranked: Vec<RankedResidual> = residuals
        .iter()
        .enumerate()
        .map(|(row, &residual)| RankedResidual { row, residual })
        .collect();
    ranked.sort_by(|a, b| {
        b.residual
            .abs()
            .partial_cmp(&a.residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top_n);
    ranked
}
