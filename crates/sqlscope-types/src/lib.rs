//! Shared wire types for the sqlscope gateway and client.
//!
//! - [`envelope`]: backend `{ data, error }` envelope decoding
//! - [`tokens`]: access/refresh token newtypes and payload normalization
//! - [`user`]: the session principal returned by `/auth/me`
//! - [`auth`] / [`admin`]: request and response bodies for the proxied routes

pub mod admin;
pub mod auth;
pub mod envelope;
pub mod tokens;
pub mod user;

pub use admin::{CreateUserRequest, RoleUpdate, StatusUpdate};
pub use auth::{LoginRequest, RefreshResponse, RegisterRequest, SessionResponse};
pub use envelope::{BackendBody, ErrorCode, ErrorDescriptor, Unwrapped, failure_message, unwrap_envelope};
pub use tokens::{AccessToken, RefreshToken, TokenPair, parse_bearer, strip_tokens};
pub use user::{User, UserId, select_user_payload};

/// Name of the HTTP-only cookie that carries the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "rt";
