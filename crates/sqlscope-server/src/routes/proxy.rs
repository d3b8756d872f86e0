//! Shared forwarding helpers.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use sqlscope_types::{BackendBody, ErrorDescriptor};

use crate::backend::BackendCall;
use crate::error::{ProxyError, Result};
use crate::state::AppState;

/// The caller's `Authorization` header, if present and non-empty.
pub fn authorization(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers
        .get(header::AUTHORIZATION)
        .filter(|v| !v.is_empty())
}

/// Unwrap a JSON body extraction, reporting rejections as `{ message }`.
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ProxyError::BadRequest(rejection.body_text()))
}

/// The payload of a 2xx body: envelope `data`, else the whole body. An
/// envelope error is handed to `on_error`.
pub fn envelope_payload(
    body: Value,
    on_error: impl FnOnce(ErrorDescriptor) -> ProxyError,
) -> Result<Value> {
    match BackendBody::decode(body.clone()) {
        BackendBody::Envelope {
            error: Some(error), ..
        } => Err(on_error(error)),
        BackendBody::Envelope {
            data: Some(data), ..
        } => Ok(data),
        BackendBody::Envelope { data: None, .. } => Ok(body),
        BackendBody::Raw(value) => Ok(value),
    }
}

/// Send `call` and return the 2xx body (`Null` when empty).
pub async fn fetch(state: &AppState, call: BackendCall, fallback: &'static str) -> Result<Value> {
    let response = state
        .backend
        .send(call)
        .await
        .map_err(ProxyError::transport(fallback))?
        .success(fallback)?;
    Ok(response.into_value().unwrap_or(Value::Null))
}

/// Forward `call` and relay the unwrapped payload.
///
/// Envelope errors become 400 with the bare descriptor. An empty 2xx body
/// becomes 204.
pub async fn relay(state: &AppState, call: BackendCall, fallback: &'static str) -> Result<Response> {
    let response = state
        .backend
        .send(call)
        .await
        .map_err(ProxyError::transport(fallback))?
        .success(fallback)?;

    let Some(body) = response.into_value() else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let payload = envelope_payload(body, |error| ProxyError::Envelope {
        status: StatusCode::BAD_REQUEST,
        error,
        wrapped: false,
    })?;
    Ok(Json(payload).into_response())
}
