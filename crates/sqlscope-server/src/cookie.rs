//! Refresh cookie handling.
//!
//! The refresh token only ever travels in the `rt` cookie:
//! `HttpOnly; SameSite=Lax; Path=/`, plus `Secure` in production.

use axum::http::{HeaderMap, HeaderValue, header};
use sqlscope_types::{REFRESH_COOKIE_NAME, RefreshToken};

/// Cookie attributes shared by set and clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// Add `Secure`.
    pub secure: bool,
    /// `Max-Age` for newly issued cookies.
    pub max_age: Option<u64>,
}

impl CookiePolicy {
    fn header_value(&self, value: &str, max_age: Option<u64>) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/",
            REFRESH_COOKIE_NAME, value
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        if let Some(age) = max_age {
            cookie.push_str(&format!("; Max-Age={}", age));
        }
        cookie
    }
}

/// Append a `Set-Cookie` issuing `token` as the refresh cookie.
pub fn set_refresh_cookie(headers: &mut HeaderMap, token: &RefreshToken, policy: &CookiePolicy) {
    let cookie = policy.header_value(token.as_str(), policy.max_age);
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(_) => tracing::warn!("Refresh token is not a valid cookie value; not issuing cookie"),
    }
}

/// Append a `Set-Cookie` expiring the refresh cookie.
pub fn clear_refresh_cookie(headers: &mut HeaderMap, policy: &CookiePolicy) {
    let cookie = policy.header_value("", Some(0));
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(header::SET_COOKIE, value);
    }
}

/// The refresh token from the request's `Cookie` header. Empty values are
/// treated as absent.
pub fn refresh_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE_NAME)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
