//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::ServerConfig;
use crate::cookie::CookiePolicy;
use crate::error::Result;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration.
    pub config: Arc<ServerConfig>,

    /// Upstream API client.
    pub backend: Backend,
}

impl AppState {
    /// Create state for `config`, building the upstream client.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let backend = Backend::new(&config.backend_url, config.backend_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            backend,
        })
    }

    /// Attributes for the refresh cookie.
    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy {
            secure: self.config.production,
            max_age: self.config.cookie_max_age,
        }
    }
}
