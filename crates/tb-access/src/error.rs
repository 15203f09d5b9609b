//! Errors surfaced by catalog fetches.
//!
//! Permission checks themselves never fail; only transport and server
//! problems reach callers, and a 403 is absorbed by the gate.

use tb_common::PermissionAction;
use thiserror::Error;

use crate::capability::DenyReason;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failure while loading the module catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The backend refused the request (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Token missing, expired or rejected (401)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Server error (5xx)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other unexpected status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, timeout or TLS failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl FetchError {
    /// True for the one failure the gate folds into "no access".
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, FetchError::Forbidden(_))
    }
}

/// A guarded operation was refused before reaching the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Permission denied: {action} on {module} ({reason})")]
    Denied {
        module: String,
        action: PermissionAction,
        reason: DenyReason,
    },
}
