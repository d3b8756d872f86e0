//! Session client for the sqlscope gateway.
//!
//! The client holds the access token in a [`TokenStore`], attaches it to
//! every call, and on a 401 refreshes once through the gateway's refresh
//! cookie before replaying the call. Concurrent 401s share a single refresh
//! via the [`RefreshCoordinator`].
//!
//! # Example
//!
//! ```no_run
//! use sqlscope_client::{SqlLogQuery, SqlscopeClient};
//!
//! # async fn example() -> sqlscope_client::Result<()> {
//! let client = SqlscopeClient::builder()
//!     .base_url("http://localhost:3000")
//!     .build()?;
//!
//! // Pick up an existing session from the refresh cookie, if any.
//! if let Some(user) = client.auth().bootstrap().await {
//!     println!("Signed in as {}", user.email);
//! }
//!
//! let logs = client
//!     .sql_logs()
//!     .list(&SqlLogQuery { db: Some("main".into()), ..Default::default() })
//!     .await?;
//! println!("{}", logs);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Auth**: login, register, logout, me, refresh, bootstrap
//! - **Admin**: list, create, re-role, change status, delete users
//! - **SQL logs**: list, scan, databases, upload
//! - **Analysis**: AI-assisted analysis per database
//! - **Health**: gateway liveness

pub mod api;
pub mod client;
pub mod error;
pub mod refresh;
pub mod request;
pub mod token_store;

pub use api::{AnalysisQuery, HealthResponse, SqlLogQuery, database_names};
pub use client::{ClientBuilder, SessionState, SqlscopeClient};
pub use error::{Error, RefreshError, Result};
pub use refresh::RefreshCoordinator;
pub use request::{ApiRequest, RequestBody, UploadContent, UploadPart};
pub use token_store::{
    FilePersistence, MemoryPersistence, Subscription, TokenListener, TokenPersistence, TokenStore,
};
