//! Database ping: one direct connection, one query, closed

use anyhow::{Context, Result};
use clap::Parser;

use edutecno_server::db::{DirectClient, QueryRequest};

use crate::config::DatabaseArgs;

const PING_SQL: &str = "SELECT NOW() AS now, version() AS version";

/// Arguments for the ping command
#[derive(Parser, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Connect, print the server time and version, close
pub async fn run_ping(args: PingArgs) -> Result<()> {
    let db = args
        .database
        .to_config()
        .context("Invalid database configuration")?;

    let client = DirectClient::new(&db);
    let request = QueryRequest::simple(PING_SQL)?;

    let result = client
        .with_connection(move |conn| Box::pin(async move { conn.query(&request).await }))
        .await
        .context("Database ping failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
