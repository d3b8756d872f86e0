//! Page guard: protected dashboard pages need a refresh cookie.
//!
//! Only page paths under a configured prefix are checked; `/api` and assets
//! pass through. The guard does not validate the cookie, only its presence.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cookie::refresh_cookie;
use crate::state::AppState;

/// Whether `path` falls under one of `prefixes`.
pub fn is_protected(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        path.strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'))
    })
}

/// `/login?next=<path>` with `path` form-encoded.
pub fn login_redirect(path: &str) -> String {
    let next: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", path)
        .finish();
    format!("/login?{}", next)
}

/// Redirect unauthenticated requests for protected pages to the login page.
pub async fn page_guard_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !is_protected(&path, &state.config.protected_prefixes)
        || refresh_cookie(request.headers()).is_some()
    {
        return next.run(request).await;
    }

    let location = login_redirect(&path);
    tracing::debug!(path = %path, "No refresh cookie for protected page, redirecting");

    match HeaderValue::from_str(&location) {
        Ok(value) => (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::UNAUTHORIZED.into_response(),
    }
}
