//! Status command - gateway liveness and the local session.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;
use sqlscope_client::SessionState;

use super::Context;
use crate::session::Session;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    running: bool,
    version: Option<String>,
    server_url: String,
    session: &'static str,
}

fn session_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Anonymous => "anonymous",
        SessionState::Authenticating => "authenticating",
        SessionState::Authenticated => "authenticated",
    }
}

/// Run the status command.
pub async fn run(_args: StatusArgs, ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let client = session.client();
    let health = client.health().check().await;
    let session_state = session_label(client.state());

    if ctx.json_output {
        let output = StatusOutput {
            running: health.is_ok(),
            version: health.as_ref().ok().map(|h| h.version.clone()),
            server_url: ctx.server_url.clone(),
            session: session_state,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("sqlscope Gateway Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    match &health {
        Ok(health) => {
            let green = Style::new().green();
            println!("  {} {}", dim.apply_to("Status:"), green.apply_to("● running"));
            println!("  {} {}", dim.apply_to("Version:"), health.version);
        }
        Err(e) => {
            let red = Style::new().red();
            println!("  {} {}", dim.apply_to("Status:"), red.apply_to("● not running"));
            if ctx.verbose {
                println!("  {} {}", dim.apply_to("Error:"), e);
            }
        }
    }
    println!("  {} {}", dim.apply_to("Gateway:"), ctx.server_url);
    println!("  {} {}", dim.apply_to("Session:"), session_state);

    if health.is_err() {
        println!();
        println!("  {}", dim.apply_to("Start the gateway with: sqlscope serve"));
    }
    println!();

    Ok(())
}
