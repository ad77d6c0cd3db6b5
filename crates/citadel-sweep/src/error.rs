//! Error types for citadel-sweep.

use thiserror::Error;

/// Result type for sweep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running or reporting a sweep.
#[derive(Debug, Error)]
pub enum Error {
    /// A simulation rejected its configuration
    #[error("Simulation error: {0}")]
    Simulation(#[from] citadel_rebalance::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad command line or environment value
    #[error("Usage error: {0}")]
    Usage(String),

    /// A worker thread panicked while simulating the given silo count
    #[error("worker for {0} silos panicked")]
    WorkerPanicked(usize),
}
