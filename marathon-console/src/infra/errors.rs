//! Console error types
//!
//! Every failure the console can observe collapses into [`ConsoleError`].
//! Variants carry owned strings rather than source errors so results can be
//! cloned into messages and replayed to observers.

use marathon_core::EnvelopeError;
use thiserror::Error;

/// Main console error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Transport-level failure: unreachable host, timeout, broken body
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered but refused the request (`success: false` or a
    /// non-2xx status)
    #[error("{}", api_message(*status, message))]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// 401 from the server; the session has already been invalidated
    #[error("Unauthorized - please login again")]
    Unauthorized,

    /// An authenticated call was attempted without a session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Payload did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Local filesystem failure (exports)
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration could not be loaded or was invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

fn api_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(status) => {
            format!("Request failed with status {status}: {message}")
        }
        None => message.to_string(),
    }
}

impl ConsoleError {
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        ConsoleError::Api {
            status,
            message: message.into(),
        }
    }

    /// Session-level failures are handled once, globally, not per call.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ConsoleError::Unauthorized | ConsoleError::NotAuthenticated
        )
    }

    /// Whether a manual retry has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConsoleError::Network(_) => true,
            ConsoleError::Api { status, .. } => {
                status.is_none_or(|status| status >= 500)
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConsoleError::Decode(err.to_string())
        } else if err.is_timeout() {
            ConsoleError::Network(format!("Connection timeout: {err}"))
        } else {
            ConsoleError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        ConsoleError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Decode(err.to_string())
    }
}

impl From<EnvelopeError> for ConsoleError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Rejected(message) => ConsoleError::api(None, message),
            EnvelopeError::MissingData => {
                ConsoleError::Decode(err.to_string())
            }
        }
    }
}

/// Type alias for console results
pub type ConsoleResult<T> = Result<T, ConsoleError>;
