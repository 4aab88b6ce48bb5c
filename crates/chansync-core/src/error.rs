//! Error types for chansync.
//!
//! Per-channel failures during a batch run are captured as data on the
//! channel's record and never surface as `Err` from the orchestrator. The
//! variants here cover the collaborator calls themselves, input loading, and
//! misuse of the run state machine.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for chansync.
#[derive(Debug, Error)]
pub enum ChansyncError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// The server answered but reported a failure.
    #[error("{message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Batch run errors
    #[error("No channels supplied for the batch run")]
    EmptyInput,

    #[error("Cannot {operation} while the run is {actual} (expected {expected})")]
    InvalidPhase {
        operation: String,
        expected: String,
        actual: String,
    },

    #[error("Channel {channel_id} has no reviewable plan")]
    ChannelNotFound { channel_id: i64 },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for chansync operations.
pub type Result<T> = std::result::Result<T, ChansyncError>;

impl From<std::io::Error> for ChansyncError {
    fn from(err: std::io::Error) -> Self {
        ChansyncError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ChansyncError {
    fn from(err: serde_json::Error) -> Self {
        ChansyncError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Timeouts are only reported as `Timeout` by `HttpClient`, which knows the
/// configured duration.
impl From<reqwest::Error> for ChansyncError {
    fn from(err: reqwest::Error) -> Self {
        ChansyncError::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<url::ParseError> for ChansyncError {
    fn from(err: url::ParseError) -> Self {
        ChansyncError::Config {
            message: format!("Invalid URL: {}", err),
        }
    }
}

impl ChansyncError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ChansyncError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Build an `InvalidPhase` error.
    pub(crate) fn invalid_phase(
        operation: &str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        ChansyncError::InvalidPhase {
            operation: operation.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Whether the failure is transient on the transport level.
    ///
    /// Informational only: the batch never retries a channel on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChansyncError::Network { .. } | ChansyncError::Timeout(_) => true,
            ChansyncError::Api {
                status_code: Some(code),
                ..
            } => matches!(code, 408 | 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}
