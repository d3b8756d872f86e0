//! Serve command - runs the gateway.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use sqlscope_config::{BackendConfig, SqlscopeConfig};
use sqlscope_server::{Server, ServerConfig};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Upstream API base URL (overrides config and BACKEND_URL)
    #[arg(long)]
    pub backend: Option<String>,

    /// Mark the refresh cookie Secure
    #[arg(long)]
    pub production: bool,

    /// Refresh cookie lifetime in seconds
    #[arg(long)]
    pub cookie_max_age: Option<u64>,

    /// Serve the built dashboard from this directory
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Allowed CORS origin (can be specified multiple times)
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<String>,

    /// Forward logout to the backend before clearing the cookie
    #[arg(long)]
    pub backend_logout: bool,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let config = apply_overrides(ctx.config.clone(), &args);
    let server_config = ServerConfig::from_config(&config)?;

    if ctx.verbose {
        if ctx.config_sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in &ctx.config_sources {
                println!("Loaded config: {}", source.display());
            }
        }
        println!("Backend: {}", server_config.backend_url);
        println!(
            "Cookie: {}{}",
            if server_config.production { "Secure, " } else { "" },
            server_config
                .cookie_max_age
                .map(|s| format!("Max-Age={}", s))
                .unwrap_or_else(|| "session".to_string())
        );
    }

    println!(
        "sqlscope gateway listening on http://{}",
        server_config.bind_address
    );

    Server::new(server_config)?.run().await?;
    Ok(())
}

fn apply_overrides(mut config: SqlscopeConfig, args: &ServeArgs) -> SqlscopeConfig {
    let mut server = config.server();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(bind) = &args.bind {
        server.bind = bind.clone();
    }
    if args.production {
        server.production = true;
    }
    if let Some(dir) = &args.static_dir {
        server.static_dir = Some(dir.clone());
    }
    if !args.cors_origins.is_empty() {
        server.cors_origins = args.cors_origins.clone();
    }
    if args.backend_logout {
        server.backend_logout = true;
    }
    config.server = Some(server);

    if let Some(url) = &args.backend {
        config.backend.get_or_insert_with(BackendConfig::default).url = Some(url.clone());
    }
    if let Some(age) = args.cookie_max_age {
        config.cookie.get_or_insert_with(Default::default).max_age_secs = Some(age);
    }
    config
}
