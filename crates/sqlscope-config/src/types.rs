//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]                 # gateway listener and page guard
//! [backend]                # upstream API
//! [cookie]                 # refresh cookie lifetime
//! [client]                 # CLI session settings
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default gateway port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default gateway bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default upstream request timeout in seconds.
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

/// Default refresh wait bound for the client, in seconds.
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlscopeConfig {
    pub server: Option<ServerConfig>,
    pub backend: Option<BackendConfig>,
    pub cookie: Option<CookieConfig>,
    pub client: Option<ClientConfig>,
}

impl SqlscopeConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: SqlscopeConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.cookie.is_some() {
            self.cookie = other.cookie;
        }
        if other.client.is_some() {
            self.client = other.client;
        }
    }

    /// Server section, or defaults.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Cookie section, or defaults.
    pub fn cookie(&self) -> CookieConfig {
        self.cookie.clone().unwrap_or_default()
    }

    /// Client section, or defaults.
    pub fn client(&self) -> ClientConfig {
        self.client.clone().unwrap_or_default()
    }

    /// Backend section; the URL is mandatory for the gateway.
    pub fn backend(&self) -> Result<BackendConfig> {
        let backend = self.backend.clone().unwrap_or_default();
        match backend.url.as_deref() {
            None | Some("") => Err(ConfigError::MissingField {
                field: "url".to_string(),
                context: "[backend] (or set BACKEND_URL)".to_string(),
            }),
            Some(_) => Ok(backend),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Gateway server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Production mode; marks the refresh cookie `Secure`.
    pub production: bool,
    /// Enable request logging.
    pub request_logging: bool,
    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,
    /// Path prefixes that require a refresh cookie.
    pub protected_prefixes: Vec<String>,
    /// Directory of built dashboard assets to serve.
    pub static_dir: Option<PathBuf>,
    /// Forward logout to the backend before clearing the cookie.
    pub backend_logout: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            production: false,
            request_logging: true,
            cors_origins: Vec::new(),
            protected_prefixes: vec!["/profile".to_string()],
            static_dir: None,
            backend_logout: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Upstream API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL; routes are appended as `/v1/...`.
    pub url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cookie Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Refresh cookie settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// `Max-Age` for the refresh cookie; unset means a session cookie.
    pub max_age_secs: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// CLI client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Gateway base URL.
    pub gateway_url: String,
    /// Upper bound on a single refresh, in seconds.
    pub refresh_timeout_secs: u64,
    /// Where the access token is mirrored between invocations.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: format!("http://{}:{}", DEFAULT_BIND, DEFAULT_PORT),
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            session_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = SqlscopeConfig::from_toml(
            r#"
[server]
port = 8088
production = true
protected_prefixes = ["/profile", "/admin"]

[backend]
url = "http://backend:9000"

[cookie]
max_age_secs = 1209600

[client]
gateway_url = "http://localhost:8088"
"#,
        )
        .unwrap();

        let server = config.server();
        assert_eq!(server.port, 8088);
        assert!(server.production);
        assert_eq!(server.bind, DEFAULT_BIND);
        assert_eq!(server.protected_prefixes.len(), 2);
        let backend = config.backend().unwrap();
        assert_eq!(backend.url.as_deref(), Some("http://backend:9000"));
        assert_eq!(backend.timeout_secs, DEFAULT_BACKEND_TIMEOUT_SECS);
        assert_eq!(config.cookie().max_age_secs, Some(1_209_600));
        assert_eq!(config.client().gateway_url, "http://localhost:8088");
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = SqlscopeConfig::from_toml("").unwrap();
        let server = config.server();
        assert_eq!(server.port, DEFAULT_PORT);
        assert!(!server.production);
        assert_eq!(server.protected_prefixes, vec!["/profile".to_string()]);
        assert!(config.cookie().max_age_secs.is_none());
    }

    #[test]
    fn test_backend_url_required() {
        let config = SqlscopeConfig::new();
        let err = config.backend().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_merge_overrides_sections() {
        let mut base = SqlscopeConfig::from_toml("[server]\nport = 1\n[backend]\nurl = \"a\"").unwrap();
        let overlay = SqlscopeConfig::from_toml("[server]\nport = 2").unwrap();
        base.merge(overlay);
        assert_eq!(base.server().port, 2);
        assert_eq!(base.backend().unwrap().url.as_deref(), Some("a"));
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = SqlscopeConfig::new();
        config.backend = Some(BackendConfig {
            url: Some("http://x".to_string()),
            timeout_secs: 3,
        });
        let text = config.to_toml().unwrap();
        let parsed = SqlscopeConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.backend().unwrap().timeout_secs, 3);
    }
}
