//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`MaxSubpopulation`, `SubsampleSize`, `Parallelism`)
//! - the estimator configuration (`TheilSenConfig`)
//! - fit outputs (`FitDiagnostics`, `ModelFile`)

pub mod types;

pub use types::*;
