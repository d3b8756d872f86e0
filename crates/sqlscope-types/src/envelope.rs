//! Backend response envelope decoding.
//!
//! The backend wraps most payloads as `{ "data": ..., "error": ... }`, but some
//! endpoints return bare objects. Decoding is a fixed two-way split:
//!
//! 1. A JSON object carrying a `data` or `error` key is an [`BackendBody::Envelope`].
//! 2. Anything else is [`BackendBody::Raw`] and passes through untouched.
//!
//! Within an envelope, `error: null` means no error, a string error becomes
//! `{ message }`, and any other present error (even `{}`) hides `data`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code reported by the backend; either numeric or symbolic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{}", n),
            ErrorCode::Text(s) => f.write_str(s),
        }
    }
}

/// Error descriptor carried in the `error` field of an envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorDescriptor {
    /// Create a descriptor with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Whether the descriptor carries a message or a code.
    pub fn is_meaningful(&self) -> bool {
        self.message.is_some() || self.code.is_some()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(message) => Some(Self::new(message)),
            Value::Object(_) => Some(
                serde_json::from_value::<ErrorDescriptor>(value.clone()).unwrap_or(Self {
                    details: Some(value),
                    ..Default::default()
                }),
            ),
            other => Some(Self {
                details: Some(other),
                ..Default::default()
            }),
        }
    }
}

/// A decoded backend response body.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendBody {
    /// `{ data?, error? }` envelope.
    Envelope {
        data: Option<Value>,
        error: Option<ErrorDescriptor>,
    },
    /// Any other JSON value.
    Raw(Value),
}

impl BackendBody {
    /// Decode a backend body.
    pub fn decode(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("data") || map.contains_key("error") => {
                let error = map
                    .remove("error")
                    .and_then(ErrorDescriptor::from_value);
                let data = match error {
                    Some(_) => None,
                    None => map.remove("data").filter(|v| !v.is_null()),
                };
                BackendBody::Envelope { data, error }
            }
            other => BackendBody::Raw(other),
        }
    }

    /// Flatten into the `{ data, error }` pair callers consume.
    pub fn into_unwrapped(self) -> Unwrapped {
        match self {
            BackendBody::Envelope { data, error } => Unwrapped { data, error },
            BackendBody::Raw(value) => Unwrapped {
                data: Some(value),
                error: None,
            },
        }
    }
}

/// Result of unwrapping a backend body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unwrapped {
    pub data: Option<Value>,
    pub error: Option<ErrorDescriptor>,
}

/// Decode and flatten a backend body in one step.
pub fn unwrap_envelope(value: Value) -> Unwrapped {
    BackendBody::decode(value).into_unwrapped()
}

/// Best-effort human-readable failure reason from an error body.
///
/// Priority: envelope `error.message`, then a top-level `message`.
pub fn failure_message(body: &Value) -> Option<String> {
    let from_error = match body.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    from_error.or_else(|| {
        body.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}
