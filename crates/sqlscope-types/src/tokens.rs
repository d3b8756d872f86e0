//! Token newtypes and backend payload normalization.
//!
//! Backends disagree on key names, so token extraction walks a fixed priority
//! list per token kind. A nested `tokens` object, when present, wins over
//! top-level keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Access token keys, highest priority first.
const ACCESS_TOKEN_KEYS: [&str; 3] = ["accessToken", "access_token", "token"];

/// Refresh token keys, highest priority first.
const REFRESH_TOKEN_KEYS: [&str; 4] = ["refreshToken", "refresh_token", "rt", "refresh"];

/// Short-lived bearer credential.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl From<String> for AccessToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccessToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Long-lived credential; only ever travels inside the `rt` cookie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RefreshToken(String);

impl RefreshToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(***)")
    }
}

/// Tokens found in a backend login/refresh payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
}

impl TokenPair {
    /// Extract tokens from a backend payload.
    pub fn extract(payload: &Value) -> Self {
        let Some(obj) = payload.as_object() else {
            return Self::default();
        };

        let top = Self::from_object(obj);
        let nested = obj
            .get("tokens")
            .and_then(Value::as_object)
            .map(Self::from_object)
            .unwrap_or_default();

        Self {
            access_token: nested.access_token.or(top.access_token),
            refresh_token: nested.refresh_token.or(top.refresh_token),
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            access_token: first_string(obj, &ACCESS_TOKEN_KEYS).map(AccessToken::new),
            refresh_token: first_string(obj, &REFRESH_TOKEN_KEYS).map(RefreshToken::new),
        }
    }
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, rest) = header.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Remove every token-bearing key from a payload object, including a nested
/// `tokens` object. Non-objects are left alone.
pub fn strip_tokens(payload: &mut Value) {
    if let Some(obj) = payload.as_object_mut() {
        for key in ACCESS_TOKEN_KEYS.iter().chain(REFRESH_TOKEN_KEYS.iter()) {
            obj.remove(*key);
        }
        obj.remove("tokens");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_camel_case() {
        let pair = TokenPair::extract(&json!({ "accessToken": "a", "refreshToken": "r" }));
        assert_eq!(pair.access_token, Some(AccessToken::new("a")));
        assert_eq!(pair.refresh_token, Some(RefreshToken::new("r")));
    }

    #[test]
    fn test_extract_priority_order() {
        let pair = TokenPair::extract(&json!({
            "token": "low",
            "access_token": "mid",
            "accessToken": "high",
            "refresh": "r-low",
            "rt": "r-mid",
        }));
        assert_eq!(pair.access_token.unwrap().as_str(), "high");
        assert_eq!(pair.refresh_token.unwrap().as_str(), "r-mid");
    }

    #[test]
    fn test_nested_tokens_override_top_level() {
        let pair = TokenPair::extract(&json!({
            "accessToken": "outer",
            "refresh_token": "outer-rt",
            "tokens": { "access_token": "inner" }
        }));
        assert_eq!(pair.access_token.unwrap().as_str(), "inner");
        // nested object has no refresh token, so the top-level one survives
        assert_eq!(pair.refresh_token.unwrap().as_str(), "outer-rt");
    }

    #[test]
    fn test_extract_ignores_empty_and_non_string() {
        let pair = TokenPair::extract(&json!({ "accessToken": "", "access_token": 5, "token": "t" }));
        assert_eq!(pair.access_token.unwrap().as_str(), "t");
        assert_eq!(TokenPair::extract(&json!("nope")), TokenPair::default());
    }

    #[test]
    fn test_strip_tokens() {
        let mut payload = json!({
            "email": "a@b.c",
            "accessToken": "a",
            "rt": "r",
            "refresh": "r2",
            "tokens": { "refreshToken": "r3" }
        });
        strip_tokens(&mut payload);
        assert_eq!(payload, json!({ "email": "a@b.c" }));

        let mut scalar = json!("x");
        strip_tokens(&mut scalar);
        assert_eq!(scalar, json!("x"));
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("bearer   abc "), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Bearer"), None);
    }

    #[test]
    fn test_debug_is_redacted() {
        let token = AccessToken::new("secret");
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
        assert_eq!(token.bearer(), "Bearer secret");
    }
}
