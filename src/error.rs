use std::time::Duration;

use thiserror::Error;

/// Errors produced by an encoder capability
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    /// The codec could not produce output at this quality
    #[error("Encoding failed at quality {quality:.3}: {message}")]
    EncodingFailed { quality: f64, message: String },

    /// The lossless reference payload could not be produced
    #[error("Reference encoding failed: {message}")]
    ReferenceFailed { message: String },

    /// Source bytes could not be decoded into an image
    #[error("Decode error: {message}")]
    Decode { message: String },
}

/// Errors returned by the quality search for a single image
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// An encode inside the search loop failed; the search stops at once
    #[error(transparent)]
    Encoding(#[from] EncodeError),

    /// Attempts ran out and the best-effort encode failed as well
    #[error("No viable result: best-effort encode at quality {quality:.3} failed: {source}")]
    NoViableResult {
        quality: f64,
        #[source]
        source: EncodeError,
    },
}

/// Errors that fail a whole batch call.
///
/// Per-item failures never show up here; they become empty slots.
#[derive(Debug, Clone, Error)]
pub enum BatchError {
    /// The batch did not finish within the configured timeout
    #[error("Batch timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Concurrency cap must allow at least one encode
    #[error("Invalid concurrency: must be at least 1")]
    InvalidConcurrency,
}
