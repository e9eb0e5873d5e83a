//! Error types for the growing API client

use thiserror::Error;

/// Client error
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credential missing, expired, or rejected by the server (HTTP 401)
    #[error("authentication failed")]
    Unauthorized {
        /// User-facing message from the error body, empty when none was sent
        message: String,
    },

    /// Request rejected by the server (other 4xx)
    #[error("request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// Server-side failure (5xx)
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// HTTP request failed (connectivity, timeout, decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential persistence failed
    #[error("credential storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Classify a non-success HTTP status
    ///
    /// `message` is the user-facing text extracted from the error body, empty
    /// when the body carried none.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ApiError::Unauthorized { message },
            400..=499 => ApiError::Validation { status, message },
            _ => ApiError::Server { status, message },
        }
    }

    /// Whether this error means the credential was rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Text for a failure descriptor: the server's message when it sent one,
    /// otherwise the operation's fallback
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::Validation { message, .. }
            | ApiError::Server { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
