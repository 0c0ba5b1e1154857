//! # Raw Failure Shape
//!
//! The classifier's input: whatever the remote-call layer actually caught,
//! presented with as much structure as was available. An HTTP status with
//! optional body, a transport-level code/message, a plain exception, or an
//! arbitrary non-error value.

use thiserror::Error;

/// One raw failure, as caught at the remote-call boundary.
#[derive(Debug, Clone, Error)]
pub enum RawFailure {
    /// The remote answered with a non-success HTTP status.
    #[error("HTTP status {status}")]
    Http { status: u16, body: Option<String> },

    /// The request never completed at the transport layer.
    #[error("transport failure: {message}")]
    Transport {
        code: Option<String>,
        message: String,
    },

    /// A language-level error with a name and message.
    #[error("{message}")]
    Exception {
        name: Option<String>,
        message: String,
    },

    /// Something that is not an error was surfaced as a failure.
    #[error("non-error value raised")]
    Value(serde_json::Value),
}

impl RawFailure {
    /// HTTP failure with an optional response body.
    pub fn http(status: u16, body: impl Into<Option<String>>) -> Self {
        RawFailure::Http {
            status,
            body: body.into(),
        }
    }

    /// Transport failure with an optional protocol-level error code.
    pub fn transport(code: impl Into<Option<String>>, message: impl Into<String>) -> Self {
        RawFailure::Transport {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Named exception.
    pub fn exception(name: impl Into<Option<String>>, message: impl Into<String>) -> Self {
        RawFailure::Exception {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Capture any `std::error::Error` as an exception failure.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        RawFailure::Exception {
            name: None,
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for RawFailure {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return RawFailure::Http {
                status: status.as_u16(),
                body: None,
            };
        }
        if err.is_timeout() {
            return RawFailure::Transport {
                code: Some("ETIMEDOUT".to_string()),
                message: err.to_string(),
            };
        }
        if err.is_connect() {
            return RawFailure::Transport {
                code: None,
                message: err.to_string(),
            };
        }
        RawFailure::Exception {
            name: Some("reqwest".to_string()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RawFailure {
    fn from(err: serde_json::Error) -> Self {
        RawFailure::Exception {
            name: Some("serde_json".to_string()),
            message: err.to_string(),
        }
    }
}
