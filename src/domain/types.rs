//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON next to a fitted model
//! - parsed from CLI flags (`FromStr`)
//!
//! Options with sentinel values ("auto", "unbounded", negative job counts) are
//! modelled as enums and resolved once, at the start of a fit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TheilSenError;

/// Default cap on the number of subsets considered.
pub const DEFAULT_MAX_SUBPOPULATION: u64 = 10_000;

/// Cap on the number of subsets (subpopulations) used for candidate slopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxSubpopulation {
    /// At most this many subsets (must be positive).
    Limit(u64),
    /// Enumerate every combination, however many there are.
    Unbounded,
}

impl MaxSubpopulation {
    /// Whether `count` subsets fit within the budget.
    pub fn admits(self, count: u128) -> bool {
        match self {
            MaxSubpopulation::Limit(limit) => count <= limit as u128,
            MaxSubpopulation::Unbounded => true,
        }
    }
}

impl Default for MaxSubpopulation {
    fn default() -> Self {
        MaxSubpopulation::Limit(DEFAULT_MAX_SUBPOPULATION)
    }
}

impl TryFrom<i64> for MaxSubpopulation {
    type Error = TheilSenError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(TheilSenError::invalid(format!(
                "max_subpopulation must be a positive integer or 'unbounded', got {value}"
            )));
        }
        Ok(MaxSubpopulation::Limit(value as u64))
    }
}

impl FromStr for MaxSubpopulation {
    type Err = TheilSenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unbounded" | "inf" | "all" => Ok(MaxSubpopulation::Unbounded),
            other => {
                let value: i64 = other.parse().map_err(|_| {
                    TheilSenError::invalid(format!("invalid max_subpopulation '{s}'"))
                })?;
                MaxSubpopulation::try_from(value)
            }
        }
    }
}

impl fmt::Display for MaxSubpopulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxSubpopulation::Limit(limit) => write!(f, "{limit}"),
            MaxSubpopulation::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Number of samples per subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubsampleSize {
    /// Smallest size that determines a fit (`n_features`, plus one with an
    /// intercept); this maximizes the breakdown point.
    #[default]
    Auto,
    /// Explicit size, validated against the data at fit time.
    Fixed(usize),
}

impl FromStr for SubsampleSize {
    type Err = TheilSenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(SubsampleSize::Auto);
        }
        s.parse::<usize>()
            .map(SubsampleSize::Fixed)
            .map_err(|_| TheilSenError::invalid(format!("invalid n_subsamples '{s}'")))
    }
}

impl fmt::Display for SubsampleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsampleSize::Auto => write!(f, "auto"),
            SubsampleSize::Fixed(n) => write!(f, "{n}"),
        }
    }
}

/// Degree of parallelism for the slope estimation step.
///
/// Integer conversion follows the usual job-count convention: positive values
/// are worker counts, `-1` means all cores, `-k` means all cores but `k − 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    Workers(usize),
    AllCores,
    AllCoresMinus(usize),
}

impl Default for Parallelism {
    fn default() -> Self {
        Parallelism::Workers(1)
    }
}

impl Parallelism {
    /// Resolve to a concrete worker count given `available` cores.
    pub fn resolve(self, available: usize) -> Result<usize, TheilSenError> {
        let workers = match self {
            Parallelism::Workers(n) => n,
            Parallelism::AllCores => available,
            Parallelism::AllCoresMinus(k) => available.saturating_sub(k),
        };
        if workers == 0 {
            return Err(TheilSenError::invalid(format!(
                "n_jobs {self} leaves no usable workers ({available} cores available)"
            )));
        }
        Ok(workers)
    }

    /// Resolve against the cores of this machine.
    pub fn resolve_here(self) -> Result<usize, TheilSenError> {
        self.resolve(available_cores())
    }
}

/// Number of cores reported by the OS (at least 1).
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl TryFrom<i64> for Parallelism {
    type Error = TheilSenError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Err(TheilSenError::invalid(
                "n_jobs == 0 has no meaning; use a positive count or -1 for all cores",
            )),
            n if n > 0 => Ok(Parallelism::Workers(n as usize)),
            -1 => Ok(Parallelism::AllCores),
            n => Ok(Parallelism::AllCoresMinus((-(n + 1)) as usize)),
        }
    }
}

impl FromStr for Parallelism {
    type Err = TheilSenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Parallelism::AllCores);
        }
        let value: i64 = s
            .parse()
            .map_err(|_| TheilSenError::invalid(format!("invalid n_jobs '{s}'")))?;
        Parallelism::try_from(value)
    }
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parallelism::Workers(n) => write!(f, "{n}"),
            Parallelism::AllCores => write!(f, "-1"),
            Parallelism::AllCoresMinus(k) => write!(f, "-{}", k + 1),
        }
    }
}

/// Estimator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheilSenConfig {
    /// Estimate an intercept (median of residuals) in addition to slopes.
    pub fit_intercept: bool,
    pub max_subpopulation: MaxSubpopulation,
    pub n_subsamples: SubsampleSize,
    pub n_jobs: Parallelism,
    /// Spatial median iteration cap.
    pub max_iter: usize,
    /// Spatial median relative tolerance.
    pub tol: f64,
    /// Seed for sampled subsets; `None` draws from OS entropy.
    pub random_state: Option<u64>,
    /// Log progress at info level instead of debug.
    pub verbose: bool,
}

impl Default for TheilSenConfig {
    fn default() -> Self {
        Self {
            fit_intercept: true,
            max_subpopulation: MaxSubpopulation::default(),
            n_subsamples: SubsampleSize::Auto,
            n_jobs: Parallelism::default(),
            max_iter: 300,
            tol: 1e-3,
            random_state: None,
            verbose: false,
        }
    }
}

/// Which branch of the fit produced the coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPath {
    /// Spatial median over subset slopes.
    Subpopulations,
    /// More features than samples: plain least squares on all rows.
    LeastSquares,
}

/// How a fit was carried out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub path: FitPath,
    pub n_samples: usize,
    pub n_features: usize,
    pub n_subsamples: usize,
    pub n_subpopulation: usize,
    /// All `C(n_samples, n_subsamples)` subsets were used.
    pub exhaustive: bool,
    pub n_workers: usize,
    pub median_iterations: usize,
    pub median_converged: bool,
}

/// A saved model file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub breakdown_point: f64,
    pub diagnostics: FitDiagnostics,
    pub config: TheilSenConfig,
}
