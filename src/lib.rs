//! `theil-sen` library crate.
//!
//! Theil–Sen robust multivariate linear regression: candidate slopes from
//! many small subsets of the data, aggregated with their spatial median.
//!
//! The binary (`theilsen`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the estimator can be used directly (`fit::TheilSen`)

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;
