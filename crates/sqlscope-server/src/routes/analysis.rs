//! AI analysis route.

use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
    response::Response,
};

use super::proxy::{authorization, relay};
use crate::backend::BackendCall;
use crate::error::Result;
use crate::state::AppState;

/// `GET /api/ai-analysis` (and `/api/v1/ai-analysis`), query forwarded.
pub async fn analyze(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response> {
    let call = BackendCall::get(["ai-analysis"])
        .query(query)
        .authorization(authorization(&headers));
    relay(&state, call, "AI analysis request failed").await
}
