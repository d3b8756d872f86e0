//! Admin user management, forwarded with the caller's token.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, Method},
    response::Response,
};
use serde_json::{Value, json};
use sqlscope_types::{RoleUpdate, StatusUpdate};

use super::proxy::{authorization, json_body, relay};
use crate::backend::BackendCall;
use crate::error::Result;
use crate::state::AppState;

fn users(extra: &[&str]) -> Vec<String> {
    ["admin", "users"]
        .iter()
        .chain(extra)
        .map(|s| s.to_string())
        .collect()
}

/// `GET /api/admin/users`
pub async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let call = BackendCall::get(users(&[])).authorization(authorization(&headers));
    relay(&state, call, "Failed to load users").await
}

/// `POST /api/admin/users`
///
/// The body is forwarded as-is so that backend-specific fields survive.
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let body = json_body(payload)?;
    let call = BackendCall::post(users(&[]))
        .authorization(authorization(&headers))
        .json(body);
    relay(&state, call, "Failed to create user").await
}

/// `PUT /api/admin/users/{id}/role`: only `role` is sent upstream.
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: std::result::Result<Json<RoleUpdate>, JsonRejection>,
) -> Result<Response> {
    let update = json_body(payload)?;
    let call = BackendCall::new(Method::PUT, users(&[id.as_str(), "role"]))
        .authorization(authorization(&headers))
        .json(json!({ "role": update.role }));
    relay(&state, call, "Failed to update role").await
}

/// `PUT /api/admin/users/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: std::result::Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Response> {
    let update = json_body(payload)?;
    let call = BackendCall::new(Method::PUT, users(&[id.as_str(), "status"]))
        .authorization(authorization(&headers))
        .json(json!({ "status": update.status }));
    relay(&state, call, "Failed to update status").await
}

/// `DELETE /api/admin/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let call =
        BackendCall::new(Method::DELETE, users(&[id.as_str()])).authorization(authorization(&headers));
    relay(&state, call, "Failed to delete user").await
}
