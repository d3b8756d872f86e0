//! Configuration for the sqlscope gateway and CLI.
//!
//! Provides TOML-based configuration with:
//! - `[server]`: gateway bind address, production mode, page guard, static assets
//! - `[backend]`: upstream API base URL and timeout
//! - `[cookie]`: refresh cookie lifetime
//! - `[client]`: gateway URL and session persistence for the CLI
//!
//! Layering (later overrides earlier): user config dir, `./sqlscope.toml`,
//! then environment (`BACKEND_URL`, `SQLSCOPE_ENV`).

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, apply_env_overrides, load_config, load_config_file,
    load_config_with_options, save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
