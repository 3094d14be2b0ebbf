//! Error types for the streaming core.

use thiserror::Error;

/// Result type alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors produced by the polling streams.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The watched entity no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// The fetch collaborator was refused access.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The fetch collaborator failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The background poller went away without reporting an error.
    #[error("stream closed unexpectedly")]
    Closed,
}

impl StreamError {
    /// Creates a fetch error from anything displayable.
    #[must_use]
    pub fn fetch(err: impl std::fmt::Display) -> Self {
        Self::Fetch(err.to_string())
    }
}
