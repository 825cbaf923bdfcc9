//! Error types for Tagbase
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Validation errors (`InvalidTtl`, `InvalidQuery`) are raised
//! synchronously before any store I/O. Store and batch errors surface transport
//! or per-command failures from the underlying key-value store; the store gives
//! best-effort atomicity only, so a failed batch may have partially applied.

use thiserror::Error;

/// Result type alias for Tagbase operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the tag/index engine
#[derive(Debug, Error)]
pub enum Error {
    /// TTL below the minimum the store supports
    #[error("Invalid TTL: expirations must be >= 1 second, got {0}")]
    InvalidTtl(u64),

    /// Malformed query expression (e.g. a single-element OR)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Serialization/deserialization error for entry values
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Store-transport error (connection failure, wrong key type, etc.)
    #[error("Store error: {0}")]
    Store(String),

    /// One or more commands inside an executed batch reported an error
    ///
    /// The store does not roll back, so earlier commands in the batch may
    /// already have applied.
    #[error("Batch execution failed: {failed} of {total} commands errored")]
    BatchFailed {
        /// Number of commands that errored
        failed: usize,
        /// Total number of commands in the batch
        total: usize,
    },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
