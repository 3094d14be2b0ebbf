//! Error types for the glue-proto crate.

use thiserror::Error;

/// Errors that can occur while building or decoding wire types.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Identifier is empty or contains forbidden characters.
    #[error("invalid {kind} id: {value:?}")]
    InvalidId {
        /// Which kind of identifier was rejected.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Tag does not normalize to a valid tag.
    #[error("invalid tag {0:?}: {1}")]
    InvalidTag(String, &'static str),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),
}

impl From<serde_json::Error> for ProtoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decoding(err.to_string())
    }
}
