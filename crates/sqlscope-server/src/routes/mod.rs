//! Gateway routes.
//!
//! Local `/api/...` paths map onto backend `/v1/...` paths.

pub mod admin;
pub mod analysis;
pub mod auth;
pub mod health;
pub mod proxy;
pub mod sql_logs;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::state::AppState;

pub use health::{HealthResponse, health_routes};

/// All `/api` routes, relative to the `/api` mount point.
pub fn api_routes(max_body_size: usize) -> Router<AppState> {
    Router::new()
        // Session
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        // Admin user management
        .route(
            "/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route("/admin/users/{id}", axum::routing::delete(admin::delete_user))
        .route("/admin/users/{id}/role", put(admin::update_role))
        .route("/admin/users/{id}/status", put(admin::update_status))
        // SQL logs
        .route("/sql-logs", get(sql_logs::list))
        .route("/sql-logs/scan", get(sql_logs::scan))
        .route("/sql-logs/databases", get(sql_logs::databases))
        .route(
            "/sql-logs/upload",
            post(sql_logs::upload).layer(DefaultBodyLimit::max(max_body_size)),
        )
        // Analysis (the v1 path is kept for existing dashboard builds)
        .route("/ai-analysis", get(analysis::analyze))
        .route("/v1/ai-analysis", get(analysis::analyze))
}
