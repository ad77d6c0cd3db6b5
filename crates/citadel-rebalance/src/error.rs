//! Error types for citadel-rebalance.

use thiserror::Error;

/// Result type for rebalancing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when configuring or running a simulation.
///
/// Numeric edge cases inside a run (zero-total loads, NaN transfers) are
/// handled in place and never surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed configuration or input vector. Raised before any cycle runs.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
