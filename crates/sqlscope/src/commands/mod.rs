//! CLI command handlers.

pub mod analyze;
pub mod auth;
pub mod config;
pub mod logs;
pub mod serve;
pub mod status;
pub mod users;

use std::path::PathBuf;

use anyhow::Result;
use console::Style;
use serde::Serialize;
use sqlscope_config::SqlscopeConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Gateway URL to connect to.
    pub server_url: String,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Resolved configuration.
    pub config: SqlscopeConfig,
    /// Config files that contributed to `config`.
    pub config_sources: Vec<PathBuf>,
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Turn a client error into a CLI error, with a hint for expired sessions.
pub fn client_error(err: sqlscope_client::Error) -> anyhow::Error {
    if err.is_auth_error() {
        let dim = Style::new().dim();
        eprintln!("{}", dim.apply_to("Session expired or missing. Run 'sqlscope auth login'."));
    } else if err.is_forbidden() {
        let dim = Style::new().dim();
        eprintln!("{}", dim.apply_to("This action requires an admin account."));
    }
    anyhow::Error::new(err)
}
