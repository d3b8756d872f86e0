//! Backend-for-frontend gateway for the sqlscope dashboard.
//!
//! The gateway sits between the browser and the upstream API. It keeps the
//! refresh token in an HTTP-only cookie, hands the browser only short-lived
//! access tokens, and forwards everything else to `<backend>/v1/...`.
//!
//! # Features
//!
//! - Session routes (`/api/auth/*`) that issue, rotate, and clear the `rt` cookie
//! - Authorization-forwarding proxies for admin, SQL log, and analysis routes
//! - Envelope (`{ data, error }`) unwrapping with per-route fallback messages
//! - Page guard redirecting cookie-less visits to protected pages
//! - Request logging and optional credentialed CORS
//!
//! # Example
//!
//! ```ignore
//! use sqlscope_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::new("http://api.internal:9000")
//!     .with_bind_address("127.0.0.1:3000".parse()?);
//!
//! Server::new(config)?.run().await?;
//! ```

pub mod backend;
pub mod config;
pub mod cookie;
pub mod error;
pub mod guard;
pub mod logging;
pub mod routes;
pub mod state;

pub use backend::{Backend, BackendCall, BackendResponse, Payload};
pub use config::ServerConfig;
pub use cookie::{CookiePolicy, clear_refresh_cookie, refresh_cookie, set_refresh_cookie};
pub use error::{ProxyError, Result};
pub use guard::page_guard_middleware;
pub use logging::request_logging_middleware;
pub use routes::HealthResponse;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The sqlscope gateway.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server for `config`.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config)?,
        })
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let config = &self.state.config;

        let mut router = Router::new()
            .merge(routes::health_routes())
            .nest("/api", routes::api_routes(config.max_body_size));

        if let Some(dir) = &config.static_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        let mut router = router
            // Page guard (inner layer, sees the request after logging starts)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                guard::page_guard_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = cors_layer(&config.cors_origins) {
            router = router.layer(cors);
        }

        router.with_state(self.state.clone())
    }

    /// Run the server on the configured address until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address until Ctrl-C.
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ProxyError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.run_with_shutdown(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn run_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| ProxyError::Internal(format!("Failed to read local address: {}", e)))?;
        let router = self.router();

        info!(
            addr = %addr,
            backend = %self.state.backend.base_url(),
            production = self.state.config.production,
            "Starting gateway"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ProxyError::Internal(format!("Server error: {}", e)))?;

        info!("Gateway stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

/// Credentialed CORS for the listed origins; `None` when the list is empty.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}
