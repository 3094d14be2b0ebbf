//! CLI error types.

use glue_proto::ProtoError;
use glue_stream::StreamError;
use thiserror::Error;

/// Exit code for unclassified failures.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code for invalid arguments.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for missing or rejected credentials.
pub const EXIT_AUTH: u8 = 3;
/// Exit code for missing resources.
pub const EXIT_NOT_FOUND: u8 = 4;
/// Exit code for a deployment that ended without success.
pub const EXIT_DEPLOYMENT_FAILED: u8 = 5;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The backend could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or rejected credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend returned an error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Unexpected response or frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// Request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// A deployment reached a terminal status other than success.
    #[error("deployment {id} finished with status {status}")]
    DeploymentFailed {
        /// Deployment identifier.
        id: String,
        /// Final status.
        status: String,
    },

    /// A polling stream failed.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Maps the error to a process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => EXIT_USAGE,
            Self::Auth(_) | Self::Stream(StreamError::Unauthorized(_)) => EXIT_AUTH,
            Self::NotFound(_) | Self::Stream(StreamError::NotFound(_)) => EXIT_NOT_FOUND,
            Self::DeploymentFailed { .. } => EXIT_DEPLOYMENT_FAILED,
            _ => EXIT_FAILURE,
        }
    }

    /// Converts the error for a polling stream, keeping auth and not-found
    /// failures distinguishable.
    #[must_use]
    pub fn into_stream_error(self) -> StreamError {
        match self {
            Self::Auth(msg) => StreamError::Unauthorized(msg),
            Self::NotFound(what) => StreamError::NotFound(what),
            Self::Stream(err) => err,
            other => StreamError::fetch(other),
        }
    }
}

impl From<ProtoError> for CliError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::Decoding(msg) => Self::Protocol(msg),
            other => Self::InvalidArgument(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Protocol(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match err {
            WsError::Http(response) => match response.status().as_u16() {
                401 | 403 => Self::Auth("dev session rejected".into()),
                404 => Self::NotFound("dev session".into()),
                status => Self::Api {
                    status,
                    message: "dev session handshake failed".into(),
                },
            },
            other => Self::Connection(other.to_string()),
        }
    }
}
