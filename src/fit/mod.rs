//! Theil–Sen fitting.
//!
//! Responsibilities:
//!
//! - choose subsets of rows (exhaustive or sampled)
//! - estimate one slope vector per subset (parallel)
//! - aggregate slopes with the spatial median and derive the intercept

pub mod estimator;
pub mod slopes;
pub mod splitter;
pub mod subsets;

pub use estimator::*;
pub use slopes::*;
pub use splitter::*;
pub use subsets::*;
