//! Gateway configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use sqlscope_config::SqlscopeConfig;

use crate::error::{ProxyError, Result};

/// Default upstream request timeout (10 seconds).
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default max body size for uploads (10 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Upstream API base URL; routes are appended as `v1/...`.
    pub backend_url: String,

    /// Upstream request timeout.
    pub backend_timeout: Duration,

    /// Production mode; the refresh cookie is marked `Secure`.
    pub production: bool,

    /// `Max-Age` for the refresh cookie. `None` issues a session cookie.
    pub cookie_max_age: Option<u64>,

    /// Enable request logging.
    pub request_logging: bool,

    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,

    /// Page prefixes that require a refresh cookie.
    pub protected_prefixes: Vec<String>,

    /// Built dashboard assets served for non-API paths.
    pub static_dir: Option<PathBuf>,

    /// Forward logout to the backend before clearing the cookie.
    pub backend_logout: bool,

    /// Maximum upload body size in bytes.
    pub max_body_size: usize,
}

impl ServerConfig {
    /// Create a config for `backend_url` with defaults for everything else.
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], sqlscope_config::DEFAULT_PORT)),
            backend_url: backend_url.into(),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            production: false,
            cookie_max_age: None,
            request_logging: true,
            cors_origins: Vec::new(),
            protected_prefixes: vec!["/profile".to_string()],
            static_dir: None,
            backend_logout: false,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Build from loaded configuration. Fails if no backend URL is set or the
    /// bind address does not parse.
    pub fn from_config(config: &SqlscopeConfig) -> Result<Self> {
        let backend = config
            .backend()
            .map_err(|e| ProxyError::Config(e.to_string()))?;
        let server = config.server();

        let bind_address: SocketAddr = format!("{}:{}", server.bind, server.port)
            .parse()
            .map_err(|e| ProxyError::Config(format!("Invalid bind address: {}", e)))?;

        Ok(Self {
            bind_address,
            backend_url: backend.url.unwrap_or_default(),
            backend_timeout: Duration::from_secs(backend.timeout_secs),
            production: server.production,
            cookie_max_age: config.cookie().max_age_secs,
            request_logging: server.request_logging,
            cors_origins: server.cors_origins,
            protected_prefixes: server.protected_prefixes,
            static_dir: server.static_dir,
            backend_logout: server.backend_logout,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        })
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the upstream timeout.
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Enable or disable production mode.
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Set the refresh cookie lifetime.
    pub fn with_cookie_max_age(mut self, secs: u64) -> Self {
        self.cookie_max_age = Some(secs);
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Replace the guarded page prefixes.
    pub fn with_protected_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.protected_prefixes = prefixes;
        self
    }

    /// Serve dashboard assets from `dir`.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Forward logout to the backend.
    pub fn with_backend_logout(mut self, enabled: bool) -> Self {
        self.backend_logout = enabled;
        self
    }

    /// Set the maximum upload body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}
