//! sqlscope - SQL log dashboard gateway and command-line client
//!
//! Main entry point for the sqlscope CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod session;

use commands::{analyze, auth, config, logs, serve, status, users};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// sqlscope - SQL log dashboard gateway and command-line client
#[derive(Parser)]
#[command(name = "sqlscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Gateway URL (default: [client].gateway_url, then http://127.0.0.1:3000)
    #[arg(long, global = true, env = "SQLSCOPE_GATEWAY_URL")]
    pub server: Option<String>,

    /// Path to config file (overrides default discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway server
    Serve(serve::ServeArgs),

    /// Show gateway status and the local session
    Status(status::StatusArgs),

    /// Sign in, register, sign out, or show the current user
    Auth(auth::AuthArgs),

    /// Manage users (admin)
    Users(users::UsersArgs),

    /// Browse, scan, and upload SQL logs
    Logs(logs::LogsArgs),

    /// Run AI analysis over a database's logs
    Analyze(analyze::AnalyzeArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "sqlscope=debug,sqlscope_client=debug,sqlscope_server=debug,sqlscope_config=debug,info"
    } else {
        "sqlscope=info,sqlscope_client=info,sqlscope_server=info,warn"
    };

    let log_dir = sqlscope_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "sqlscope.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "sqlscope=trace,sqlscope_client=trace,sqlscope_server=trace,sqlscope_config=trace,info",
                )),
        )
        .init();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => {
            let mut config = sqlscope_config::load_config_file(path)?;
            sqlscope_config::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            sqlscope_config::LoadedConfig {
                config,
                sources: vec![sqlscope_config::ConfigSource {
                    path: path.clone(),
                    loaded: true,
                }],
                warnings: Vec::new(),
            }
        }
        None => sqlscope_config::load_config(None)?,
    };

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    let server_url = cli
        .server
        .unwrap_or_else(|| loaded.config.client().gateway_url);

    // Create context for commands
    let ctx = commands::Context {
        server_url,
        json_output: cli.json,
        verbose: cli.verbose,
        config_sources: loaded.loaded_from().iter().map(|p| p.to_path_buf()).collect(),
        config: loaded.config,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Users(args) => users::run(args, &ctx).await,
        Commands::Logs(args) => logs::run(args, &ctx).await,
        Commands::Analyze(args) => analyze::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
