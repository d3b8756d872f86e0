//! Error types for the gateway.
//!
//! Every variant renders as a JSON body. Upstream failures keep the backend's
//! status and body where there is one; otherwise the route's fallback message
//! is sent as `{ "message": ... }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use sqlscope_types::ErrorDescriptor;
use thiserror::Error;

/// Gateway error type.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The backend could not be reached or timed out.
    #[error("Backend unreachable: {source}")]
    Transport {
        fallback: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}")]
    Upstream {
        status: StatusCode,
        body: Option<Value>,
        fallback: &'static str,
    },

    /// The backend answered 2xx with an envelope error.
    #[error("Backend reported an error: {error:?}")]
    Envelope {
        status: StatusCode,
        error: ErrorDescriptor,
        /// Render as `{ "error": descriptor }` instead of the bare descriptor.
        wrapped: bool,
    },

    /// Session could not be established.
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Malformed request from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Transport failure for a route with `fallback` as its message.
    pub fn transport(fallback: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ProxyError::Transport { fallback, source }
    }

    /// HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream { status, .. } | ProxyError::Envelope { status, .. } => *status,
            ProxyError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Config(_) | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// `{ "message": text }`, the body used when nothing better is available.
pub(crate) fn message(text: impl Into<String>) -> Value {
    let text: String = text.into();
    json!({ "message": text })
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let summary = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %summary, "Gateway error");
        } else {
            tracing::warn!(status = %status.as_u16(), error = %summary, "Client error");
        }

        let body = match self {
            ProxyError::Transport { fallback, .. } => message(fallback),
            ProxyError::Upstream { body, fallback, .. } => body.unwrap_or_else(|| message(fallback)),
            ProxyError::Envelope { error, wrapped, .. } => {
                if wrapped {
                    json!({ "error": error })
                } else {
                    json!(error)
                }
            }
            ProxyError::Unauthorized(text) => message(text),
            ProxyError::BadRequest(text) | ProxyError::Config(text) | ProxyError::Internal(text) => {
                message(text)
            }
        };

        (status, Json(body)).into_response()
    }
}
