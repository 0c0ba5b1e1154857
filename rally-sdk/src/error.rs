//! Error type for Rally operations.
//!
//! The SDK reports what actually happened at its own boundary and leaves
//! interpretation to the classifier: `to_raw_failure` bridges every variant
//! into the classification pipeline's input shape.

use error_handling_rs::RawFailure;
use thiserror::Error;

/// Result type for Rally SDK operations.
pub type Result<T> = std::result::Result<T, RallyError>;

/// Failure at the Rally client boundary.
#[derive(Debug, Error)]
pub enum RallyError {
    /// Rally answered with a non-success HTTP status.
    #[error("Rally responded with HTTP {status}")]
    Http { status: u16, body: Option<String> },

    /// The request never completed at the transport layer.
    #[error("transport failure: {message}")]
    Transport {
        code: Option<String>,
        message: String,
    },

    /// A 2xx response that could not be decoded into the expected envelope.
    #[error("failed to decode Rally response: {0}")]
    Decode(String),

    /// Rally accepted the request but reported WSAPI errors in the envelope.
    #[error("Rally reported errors: {}", messages.join("; "))]
    Wsapi { messages: Vec<String> },

    /// The client was built or invoked with unusable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RallyError {
    /// Present this failure in the classifier's input shape.
    pub fn to_raw_failure(&self) -> RawFailure {
        match self {
            RallyError::Http { status, body } => RawFailure::Http {
                status: *status,
                body: body.clone(),
            },
            RallyError::Transport { code, message } => RawFailure::Transport {
                code: code.clone(),
                message: message.clone(),
            },
            RallyError::Decode(message) => RawFailure::Exception {
                name: Some("DecodeError".to_string()),
                message: message.clone(),
            },
            // WSAPI errors are Rally's field-level rejections; the name
            // routes them to the validation category.
            RallyError::Wsapi { messages } => RawFailure::Exception {
                name: Some("ValidationError".to_string()),
                message: messages.join("; "),
            },
            RallyError::Configuration(message) => RawFailure::Exception {
                name: Some("ConfigurationError".to_string()),
                message: message.clone(),
            },
        }
    }
}

impl From<reqwest::Error> for RallyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return RallyError::Transport {
                code: Some("ETIMEDOUT".to_string()),
                message: err.to_string(),
            };
        }
        if err.is_connect() {
            return RallyError::Transport {
                code: None,
                message: err.to_string(),
            };
        }
        if err.is_decode() {
            return RallyError::Decode(err.to_string());
        }
        RallyError::Transport {
            code: None,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RallyError {
    fn from(err: serde_json::Error) -> Self {
        RallyError::Decode(err.to_string())
    }
}
