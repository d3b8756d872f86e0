//! Session routes: login, register, refresh, me, logout.
//!
//! These are the only handlers that see the refresh token. It arrives from
//! the backend in a response payload, leaves as the `rt` cookie, and is never
//! echoed in a response body.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use sqlscope_types::{
    LoginRequest, RefreshResponse, RefreshToken, RegisterRequest, SessionResponse, TokenPair,
    parse_bearer, select_user_payload, strip_tokens, unwrap_envelope,
};

use super::proxy::{authorization, envelope_payload, fetch, json_body};
use crate::backend::BackendCall;
use crate::cookie::{clear_refresh_cookie, refresh_cookie, set_refresh_cookie};
use crate::error::{ProxyError, Result};
use crate::state::AppState;

const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";
const REFRESH_FAILED: &str = "Refresh failed";
const ME_FAILED: &str = "Failed to load current user";

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let credentials = json_body(payload)?;
    let call = BackendCall::post(["auth", "login"]).json(json!(credentials));
    establish(&state, call, LOGIN_FAILED).await
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response> {
    let account = json_body(payload)?;
    let call = BackendCall::post(["auth", "register"]).json(json!(account));
    establish(&state, call, REGISTER_FAILED).await
}

/// `POST /api/auth/refresh`: trade the `rt` cookie for a new access token.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let rt = refresh_cookie(&headers).ok_or(ProxyError::Unauthorized("Missing refresh token"))?;

    let body = call_refresh(&state, rt, REFRESH_FAILED).await?;
    let payload = envelope_payload(body, |error| ProxyError::Envelope {
        status: StatusCode::UNAUTHORIZED,
        error,
        wrapped: true,
    })?;

    let tokens = TokenPair::extract(&payload);
    let mut response = Json(RefreshResponse {
        access_token: tokens.access_token,
    })
    .into_response();
    rotate_cookie(&state, &mut response, tokens.refresh_token);
    Ok(response)
}

/// `GET /api/auth/me`
///
/// With a bearer token the backend is asked directly. Without one, the `rt`
/// cookie is refreshed first and the rotated cookie rides on the response.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer)
        .map(str::to_string);

    let (token, rotated) = match bearer {
        Some(token) => (token, None),
        None => {
            let rt = refresh_cookie(&headers).ok_or(ProxyError::Unauthorized("Unauthorized"))?;
            let body = call_refresh(&state, rt, ME_FAILED).await?;
            let tokens = TokenPair::extract(&meaningful_payload(body)?);
            let access = tokens
                .access_token
                .ok_or(ProxyError::Unauthorized("Unauthorized"))?;
            (access.into_inner(), tokens.refresh_token)
        }
    };

    let call = BackendCall::get(["auth", "me"]).bearer(&token)?;
    let body = fetch(&state, call, ME_FAILED).await?;
    let mut user = select_user_payload(meaningful_payload(body)?);
    strip_tokens(&mut user);

    let mut response = Json(user).into_response();
    rotate_cookie(&state, &mut response, rotated);
    Ok(response)
}

/// `POST /api/auth/logout`: always clears the cookie and answers 204.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.config.backend_logout {
        let mut call = BackendCall::post(["auth", "logout"]).authorization(authorization(&headers));
        if let Some(rt) = refresh_cookie(&headers) {
            call = call.json(json!({ "refreshToken": rt }));
        }

        match state.backend.send(call).await {
            Ok(response) if response.status.is_success() => {
                tracing::debug!("Backend session revoked");
            }
            Ok(response) => {
                tracing::warn!(status = %response.status.as_u16(), "Backend logout rejected, clearing cookie anyway");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backend logout failed, clearing cookie anyway");
            }
        }
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    clear_refresh_cookie(response.headers_mut(), &state.cookie_policy());
    response
}

/// Shared by login and register.
async fn establish(state: &AppState, call: BackendCall, fallback: &'static str) -> Result<Response> {
    let body = fetch(state, call, fallback).await?;
    let payload = envelope_payload(body, |error| ProxyError::Envelope {
        status: StatusCode::BAD_REQUEST,
        error,
        wrapped: true,
    })?;

    let tokens = TokenPair::extract(&payload);
    let mut user = select_user_payload(payload);
    strip_tokens(&mut user);

    let mut response = Json(SessionResponse {
        access_token: tokens.access_token,
        user: Some(user),
    })
    .into_response();
    rotate_cookie(state, &mut response, tokens.refresh_token);
    Ok(response)
}

async fn call_refresh(state: &AppState, rt: &str, fallback: &'static str) -> Result<Value> {
    let call = BackendCall::post(["auth", "refresh"])
        .json(json!({ "refreshToken": rt, "refresh_token": rt }));
    fetch(state, call, fallback).await
}

/// Like [`envelope_payload`], but only errors with a message or code count;
/// those become a bare 401.
fn meaningful_payload(body: Value) -> Result<Value> {
    let unwrapped = unwrap_envelope(body.clone());
    match unwrapped.error {
        Some(error) if error.is_meaningful() => Err(ProxyError::Unauthorized("Unauthorized")),
        Some(_) => Ok(body
            .get("data")
            .filter(|data| !data.is_null())
            .cloned()
            .unwrap_or(body)),
        None => Ok(unwrapped.data.unwrap_or(body)),
    }
}

fn rotate_cookie(state: &AppState, response: &mut Response, token: Option<RefreshToken>) {
    if let Some(token) = token {
        set_refresh_cookie(response.headers_mut(), &token, &state.cookie_policy());
    }
}
