//! Error types for the Tablero client

use tb_access::{AccessError, FetchError};
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Tablero client
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication failed (401) or no session
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization failed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (422)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Server error (5xx)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Refused locally by a capability check; no request was sent
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Module catalog could not be loaded
    #[error("Module catalog unavailable: {0}")]
    Catalog(#[from] FetchError),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited | Error::Server { .. } => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Create an error from an HTTP status code and message
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 => Error::Authentication(message),
            403 => Error::Forbidden(message),
            404 => Error::NotFound(message),
            422 => Error::Validation(message),
            429 => Error::RateLimited,
            code @ 500..=599 => Error::Server {
                status: code,
                message,
            },
            _ => Error::Other(format!("HTTP {}: {}", status, message)),
        }
    }
}

impl From<Error> for FetchError {
    fn from(err: Error) -> Self {
        match err {
            Error::Forbidden(message) => FetchError::Forbidden(message),
            Error::Authentication(message) => FetchError::Unauthorized(message),
            Error::Server { status, message } => FetchError::Server { status, message },
            Error::NotFound(message) => FetchError::Status {
                status: 404,
                message,
            },
            Error::Validation(message) => FetchError::Status {
                status: 422,
                message,
            },
            Error::RateLimited => FetchError::Status {
                status: 429,
                message: "rate limited".to_string(),
            },
            Error::Http(e) if e.is_decode() => FetchError::Decode(e.to_string()),
            Error::Http(e) => FetchError::Transport(e.to_string()),
            Error::Json(e) => FetchError::Decode(e.to_string()),
            Error::Access(e) => FetchError::Forbidden(e.to_string()),
            Error::Catalog(e) => e,
            Error::Other(message) => FetchError::Transport(message),
        }
    }
}
