//! Logs command - SQL log browsing and upload.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;
use sqlscope_client::SqlLogQuery;

use super::{Context, client_error, print_json};
use crate::session::Session;

/// Arguments for the logs command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommand,
}

/// Paging and database selection shared by list and scan.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Database name
    #[arg(long)]
    pub db: Option<String>,

    /// Page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size
    #[arg(long)]
    pub limit: Option<u32>,
}

impl From<QueryArgs> for SqlLogQuery {
    fn from(args: QueryArgs) -> Self {
        SqlLogQuery {
            db: args.db,
            page: args.page,
            limit: args.limit,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LogsCommand {
    /// List stored log entries
    List(QueryArgs),

    /// Scan logs for problem queries
    Scan(QueryArgs),

    /// List databases with logs
    Databases,

    /// Upload a SQL log file
    Upload {
        /// File to upload
        file: PathBuf,

        /// Database the log belongs to
        #[arg(long)]
        db: String,
    },
}

/// Run the logs command.
pub async fn run(args: LogsArgs, ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let result = dispatch(args.command, &session, ctx).await;
    session.save()?;
    result
}

async fn dispatch(command: LogsCommand, session: &Session, ctx: &Context) -> Result<()> {
    let logs = session.client().sql_logs();
    match command {
        LogsCommand::List(query) => {
            let body = logs.list(&query.into()).await.map_err(client_error)?;
            print_json(&body)
        }
        LogsCommand::Scan(query) => {
            let body = logs.scan(&query.into()).await.map_err(client_error)?;
            print_json(&body)
        }
        LogsCommand::Databases => {
            let names = logs.databases().await.map_err(client_error)?;
            if ctx.json_output {
                return print_json(&names);
            }
            if names.is_empty() {
                println!("No databases.");
            }
            for name in names {
                println!("{}", name);
            }
            Ok(())
        }
        LogsCommand::Upload { file, db } => {
            if !file.is_file() {
                anyhow::bail!("Not a file: {}", file.display());
            }
            let body = logs.upload_file(&file, &db).await.map_err(client_error)?;
            if ctx.json_output {
                return print_json(&body);
            }
            let green = Style::new().green();
            println!(
                "{} {} to {}",
                green.apply_to("Uploaded"),
                file.display(),
                db
            );
            Ok(())
        }
    }
}
