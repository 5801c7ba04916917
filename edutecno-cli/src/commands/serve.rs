//! HTTP server command
//!
//! Runs the edutecno HTTP server until Ctrl+C or SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use edutecno_server::models::TableName;
use edutecno_server::{run_server, ConfigError, ServerConfig};

use crate::config::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "EDUTECNO_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Table read by the student routes
    #[arg(long, env = "EDUTECNO_STUDENTS_TABLE", default_value = "alumnos")]
    pub students_table: String,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let db = args
        .database
        .to_config()
        .context("Invalid database configuration")?;

    let students_table = TableName::new(&args.students_table)
        .map_err(ConfigError::from)
        .context("Invalid students table")?;

    tracing::info!("Starting edutecno server on {}", args.bind);

    let config = ServerConfig {
        bind_addr: args.bind,
        students_table,
    };

    // Run server (blocks until shutdown)
    run_server(&db, config).await.context("Server error")?;

    Ok(())
}
