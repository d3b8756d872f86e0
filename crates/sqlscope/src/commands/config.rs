//! Config command - configuration management.

use anyhow::Result;
use clap::{Args, Subcommand};

use sqlscope_config::{self, SqlscopeConfig};

use super::{Context, print_json};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./sqlscope.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Upstream API base URL to record
        #[arg(long)]
        backend: Option<String>,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::Init { local, backend } => cmd_init(local, backend),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    if ctx.json_output {
        return print_json(&ctx.config);
    }

    println!("# sqlscope Configuration\n");
    if ctx.config_sources.is_empty() {
        println!("# No config files loaded (using defaults)\n");
    } else {
        for source in &ctx.config_sources {
            println!("# Loaded: {}", source.display());
        }
        println!();
    }
    println!("# Gateway URL: {}\n", ctx.server_url);
    print!("{}", ctx.config.to_toml()?);
    Ok(())
}

fn cmd_path() -> Result<()> {
    match sqlscope_config::xdg_config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("Could not determine config directory"),
    }
    Ok(())
}

fn cmd_init(local: bool, backend: Option<String>) -> Result<()> {
    let path = if local {
        std::path::PathBuf::from("sqlscope.toml")
    } else {
        sqlscope_config::xdg_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }

    let config = default_config(backend);
    sqlscope_config::save_config(&config, &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn default_config(backend: Option<String>) -> SqlscopeConfig {
    SqlscopeConfig {
        server: Some(Default::default()),
        backend: Some(sqlscope_config::BackendConfig {
            url: backend,
            ..Default::default()
        }),
        cookie: Some(Default::default()),
        client: Some(Default::default()),
    }
}
