//! Numerical primitives: least squares, spatial median, breakdown point.

pub mod breakdown;
pub mod ols;
pub mod spatial_median;

pub use breakdown::*;
pub use ols::*;
pub use spatial_median::*;
