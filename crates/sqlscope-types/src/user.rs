//! The session principal.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User identifier; backends emit either numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// A user as returned by `/auth/me` and the admin listing.
///
/// Unknown fields are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pick the user object out of a `me`/login payload.
///
/// Order: `user`, then `profile`, then the payload itself.
pub fn select_user_payload(payload: Value) -> Value {
    match payload {
        Value::Object(mut obj) => {
            if let Some(user) = obj.remove("user").filter(|v| !v.is_null()) {
                return user;
            }
            if let Some(profile) = obj.remove("profile").filter(|v| !v.is_null()) {
                return profile;
            }
            Value::Object(obj)
        }
        other => other,
    }
}
