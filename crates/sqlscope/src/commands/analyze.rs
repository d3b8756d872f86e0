//! Analyze command - AI analysis of a database's SQL logs.

use anyhow::Result;
use clap::Args;
use sqlscope_client::AnalysisQuery;

use super::{Context, client_error, print_json};
use crate::session::Session;

/// Arguments for the analyze command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Database to analyze
    #[arg(long = "db")]
    pub db_name: String,
}

/// Run the analyze command.
pub async fn run(args: AnalyzeArgs, ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let result = session
        .client()
        .analysis()
        .analyze(&AnalysisQuery::for_database(args.db_name))
        .await
        .map_err(client_error);
    session.save()?;

    // The result shape is backend-defined; it is always shown as JSON.
    print_json(&result?)
}
