//! API endpoint implementations.

mod admin;
mod analysis;
mod auth;
mod health;
mod sql_logs;

pub use admin::AdminApi;
pub use analysis::{AnalysisApi, AnalysisQuery};
pub use auth::AuthApi;
pub use health::{HealthApi, HealthResponse};
pub use sql_logs::{SqlLogQuery, SqlLogsApi, database_names};
