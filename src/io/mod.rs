//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - model JSON and prediction CSV (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
