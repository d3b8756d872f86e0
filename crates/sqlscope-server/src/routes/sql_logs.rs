//! SQL log routes: listing, scanning, database names, and uploads.

use axum::{
    Json,
    extract::{Multipart, RawQuery, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use super::proxy::{authorization, relay};
use crate::backend::{BackendCall, BackendResponse};
use crate::error::{ProxyError, Result};
use crate::state::AppState;

const UPLOAD_FAILED: &str = "Failed to upload SQL logs";

/// `GET /api/sql-logs`, query forwarded.
pub async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response> {
    let call = BackendCall::get(["sql-logs"])
        .query(query)
        .authorization(authorization(&headers));
    relay(&state, call, "Failed to load SQL logs").await
}

/// `GET /api/sql-logs/scan`, query forwarded.
pub async fn scan(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response> {
    let call = BackendCall::get(["sql-logs", "scan"])
        .query(query)
        .authorization(authorization(&headers));
    relay(&state, call, "Failed to scan SQL logs").await
}

/// `GET /api/sql-logs/databases`
pub async fn databases(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let call = BackendCall::get(["sql-logs", "databases"]).authorization(authorization(&headers));
    relay(&state, call, "Failed to load databases").await
}

/// `POST /api/sql-logs/upload`
///
/// Parts are forwarded verbatim (file parts keep their file name and content
/// type). The backend's answer passes through with its status.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response> {
    let form = rebuild_form(multipart)
        .await
        .map_err(|e| ProxyError::BadRequest(e.body_text()))?;

    let call = BackendCall::post(["sql-logs", "upload"])
        .authorization(authorization(&headers))
        .multipart(form);
    let response = state
        .backend
        .send(call)
        .await
        .map_err(ProxyError::transport(UPLOAD_FAILED))?;

    Ok(upload_response(response))
}

async fn rebuild_form(mut multipart: Multipart) -> std::result::Result<Form, MultipartError> {
    let mut form = Form::new();
    let mut count = 0usize;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let part = match file_name {
            Some(file_name) => {
                let file_part = || Part::bytes(bytes.to_vec()).file_name(file_name.clone());
                match content_type {
                    Some(ct) => file_part().mime_str(&ct).unwrap_or_else(|_| {
                        tracing::debug!(field = %name, content_type = %ct, "Dropping unparseable part content type");
                        file_part()
                    }),
                    None => file_part(),
                }
            }
            None => Part::text(String::from_utf8_lossy(&bytes).into_owned()),
        };
        form = form.part(name, part);
        count += 1;
    }

    tracing::debug!(parts = count, "Forwarding upload");
    Ok(form)
}

/// JSON bodies pass through with the backend status; other text is wrapped
/// as `{ message }`.
fn upload_response(response: BackendResponse) -> Response {
    let status = response.status;
    let body = if response.is_json() {
        response.json().unwrap_or_else(|| json!({}))
    } else if response.body.trim().is_empty() {
        crate::error::message(UPLOAD_FAILED)
    } else {
        json!({ "message": response.body })
    };

    if !status.is_success() {
        tracing::warn!(status = %status.as_u16(), "Backend rejected upload");
    }
    (status, Json::<Value>(body)).into_response()
}
