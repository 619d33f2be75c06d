//! Error type shared by the estimator and the CLI.
//!
//! Every variant maps to a process exit code so the binary can stay a thin
//! wrapper: `main` prints the message and exits with `exit_code()`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TheilSenError {
    /// Bad configuration or input values, detected before any fitting work.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Inconsistent shapes between `X`, `y`, or a fitted model.
    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// The least-squares primitive produced no usable solution.
    #[error("Least-squares solve failed: {0}")]
    Solver(String),

    /// The worker pool could not be created.
    #[error("Parallel execution failed: {0}")]
    Parallel(String),

    /// File, CSV or JSON problems.
    #[error("{0}")]
    Io(String),
}

impl TheilSenError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            TheilSenError::InvalidParameter(_) | TheilSenError::Io(_) => 2,
            TheilSenError::DimensionMismatch { .. } => 3,
            TheilSenError::Solver(_) | TheilSenError::Parallel(_) => 4,
        }
    }
}
