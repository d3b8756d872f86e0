//! Client error types.

use std::time::Duration;

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gateway returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from the body, or `"unknown"`.
        code: String,
        /// Human-readable reason.
        message: String,
    },

    /// Authentication failed after the single allowed refresh.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token refresh failed; the session has been cleared.
    #[error("Session refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O failed (reading an upload, for example).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_)) || matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error (including a failed refresh).
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::Auth(_) | Error::Refresh(_) | Error::Api { status: 401, .. }
        )
    }

    /// Check if the caller lacks the required role.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Error::Api { status: 403, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a failed refresh, shared by every caller queued on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The gateway refused the refresh (missing or expired refresh cookie).
    #[error("refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The refresh call could not be completed.
    #[error("refresh transport failure: {0}")]
    Transport(String),

    /// The refresh call exceeded its time bound.
    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),

    /// The refreshing task was dropped before it produced an outcome.
    #[error("refresh abandoned before completion")]
    Abandoned,
}
