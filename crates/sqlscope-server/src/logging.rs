//! Request logging middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::Level;

use crate::state::AppState;

/// Level for a completed request: errors by status class, liveness probes
/// at debug.
fn level_for(path: &str, status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else if path == "/health" {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Structured request logging middleware.
///
/// Logs method, path, status, and duration. Query strings are not logged.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    macro_rules! log_at {
        ($level:expr) => {
            tracing::event!(
                $level,
                method = %method,
                path = %path,
                status = status.as_u16(),
                duration_ms,
                "Request completed"
            )
        };
    }

    match level_for(&path, status) {
        Level::ERROR => log_at!(Level::ERROR),
        Level::WARN => log_at!(Level::WARN),
        Level::DEBUG => log_at!(Level::DEBUG),
        _ => log_at!(Level::INFO),
    }

    response
}
