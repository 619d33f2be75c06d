//! Data sources: synthetic contaminated regression problems.

pub mod synthetic;

pub use synthetic::*;
