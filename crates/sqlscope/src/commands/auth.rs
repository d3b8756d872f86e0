//! Auth command - session management against the gateway.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use sqlscope_types::{LoginRequest, RegisterRequest, User};

use super::{Context, client_error, print_json};
use crate::session::Session;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Password (prompted if not given)
        #[arg(long, env = "SQLSCOPE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Account email
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Password (prompted if not given)
        #[arg(long, env = "SQLSCOPE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { email, password } => cmd_login(email, password, ctx).await,
        AuthCommand::Register {
            email,
            name,
            password,
        } => cmd_register(email, name, password, ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
        AuthCommand::Whoami => cmd_whoami(ctx).await,
    }
}

fn read_password(given: Option<String>) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => Ok(rpassword::prompt_password("Password: ")?),
    }
}

async fn cmd_login(email: String, password: Option<String>, ctx: &Context) -> Result<()> {
    let password = read_password(password)?;
    let session = Session::open(ctx)?;

    let user = session
        .client()
        .auth()
        .login(&LoginRequest { email, password })
        .await
        .map_err(client_error)?;
    session.save()?;

    report_signed_in(user.as_ref(), ctx)
}

async fn cmd_register(
    email: String,
    name: Option<String>,
    password: Option<String>,
    ctx: &Context,
) -> Result<()> {
    let password = read_password(password)?;
    let session = Session::open(ctx)?;

    let user = session
        .client()
        .auth()
        .register(&RegisterRequest {
            email,
            password,
            name,
        })
        .await
        .map_err(client_error)?;
    session.save()?;

    report_signed_in(user.as_ref(), ctx)
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;

    // The local session is dropped whatever the gateway says.
    if let Err(e) = session.client().auth().logout().await {
        tracing::warn!(error = %e, "Gateway logout failed");
        if ctx.verbose {
            eprintln!("warning: gateway logout failed: {}", e);
        }
    }
    session.forget()?;

    if ctx.json_output {
        print_json(&serde_json::json!({ "signedIn": false }))
    } else {
        println!("Signed out.");
        Ok(())
    }
}

async fn cmd_whoami(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let user = session.client().auth().me().await.map_err(client_error)?;
    session.save()?;

    if ctx.json_output {
        return print_json(&user);
    }
    print_user(&user);
    Ok(())
}

fn report_signed_in(user: Option<&User>, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        return print_json(&serde_json::json!({ "signedIn": true, "user": user }));
    }

    let green = Style::new().green();
    println!("{}", green.apply_to("Signed in."));
    if let Some(user) = user {
        print_user(user);
    }
    Ok(())
}

pub(crate) fn print_user(user: &User) {
    let dim = Style::new().dim();
    println!();
    println!("  {} {}", dim.apply_to("Email:"), style(&user.email).bold());
    if let Some(name) = &user.name {
        println!("  {} {}", dim.apply_to("Name:"), name);
    }
    if let Some(id) = &user.id {
        println!("  {} {}", dim.apply_to("Id:"), id);
    }
    if let Some(role) = &user.role {
        println!("  {} {}", dim.apply_to("Role:"), role);
    }
    if let Some(status) = &user.status {
        println!("  {} {}", dim.apply_to("Status:"), status);
    }
    println!();
}
