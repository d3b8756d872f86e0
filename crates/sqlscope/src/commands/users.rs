//! Users command - admin user management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use sqlscope_types::{CreateUserRequest, User, UserId};

use super::{Context, client_error, print_json};
use crate::session::Session;

/// Arguments for the users command.
#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users
    List,

    /// Create a user
    Create {
        /// Account email
        #[arg(long)]
        email: String,

        /// Initial password
        #[arg(long, env = "SQLSCOPE_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Initial role
        #[arg(long)]
        role: Option<String>,
    },

    /// Change a user's role
    Role {
        /// User id
        id: String,
        /// New role
        role: String,
    },

    /// Change a user's status
    Status {
        /// User id
        id: String,
        /// New status (e.g. active, disabled)
        status: String,
    },

    /// Delete a user
    Delete {
        /// User id
        id: String,
    },
}

/// Run the users command.
pub async fn run(args: UsersArgs, ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let result = dispatch(args.command, &session, ctx).await;

    // A refresh may have rotated the cookie even when the call failed.
    session.save()?;
    result
}

async fn dispatch(command: UsersCommand, session: &Session, ctx: &Context) -> Result<()> {
    match command {
        UsersCommand::List => cmd_list(session, ctx).await,
        UsersCommand::Create {
            email,
            password,
            name,
            role,
        } => {
            let request = CreateUserRequest {
                email,
                password,
                name,
                role,
            };
            cmd_create(session, request, ctx).await
        }
        UsersCommand::Role { id, role } => {
            let body = session
                .client()
                .admin()
                .update_role(&parse_id(&id), role)
                .await
                .map_err(client_error)?;
            report(ctx, &body, &format!("Updated role for user {}", id))
        }
        UsersCommand::Status { id, status } => {
            let body = session
                .client()
                .admin()
                .update_status(&parse_id(&id), status)
                .await
                .map_err(client_error)?;
            report(ctx, &body, &format!("Updated status for user {}", id))
        }
        UsersCommand::Delete { id } => {
            session
                .client()
                .admin()
                .delete_user(&parse_id(&id))
                .await
                .map_err(client_error)?;
            report(ctx, &serde_json::json!({ "deleted": id }), &format!("Deleted user {}", id))
        }
    }
}

/// Numeric ids are sent as numbers, anything else as text.
fn parse_id(raw: &str) -> UserId {
    raw.parse::<i64>()
        .map(UserId::Number)
        .unwrap_or_else(|_| UserId::Text(raw.to_string()))
}

async fn cmd_list(session: &Session, ctx: &Context) -> Result<()> {
    let users = session.client().admin().list_users().await.map_err(client_error)?;

    if ctx.json_output {
        return print_json(&users);
    }

    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!(
        "  {:<8} {:<32} {:<12} {}",
        dim.apply_to("ID"),
        dim.apply_to("EMAIL"),
        dim.apply_to("ROLE"),
        dim.apply_to("STATUS")
    );
    for user in &users {
        print_row(user);
    }
    println!();
    Ok(())
}

fn print_row(user: &User) {
    println!(
        "  {:<8} {:<32} {:<12} {}",
        user.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
        user.email,
        user.role.as_deref().unwrap_or("-"),
        user.status.as_deref().unwrap_or("-")
    );
}

async fn cmd_create(session: &Session, request: CreateUserRequest, ctx: &Context) -> Result<()> {
    let user = session
        .client()
        .admin()
        .create_user(&request)
        .await
        .map_err(client_error)?;

    if ctx.json_output {
        return print_json(&user);
    }
    println!("{} {}", Style::new().green().apply_to("Created"), style(&user.email).bold());
    Ok(())
}

fn report(ctx: &Context, body: &serde_json::Value, message: &str) -> Result<()> {
    if ctx.json_output {
        print_json(body)
    } else {
        println!("{}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), UserId::Number(42));
        assert_eq!(parse_id("u-42"), UserId::Text("u-42".into()));
    }
}
