//! edutecno CLI
//!
//! - `serve`: run the HTTP server (pooled and direct database routes)
//! - `ping`: check database reachability over a direct connection

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "edutecno",
    author,
    version,
    about = "JSON over PostgreSQL: current time and student queries"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(commands::serve::ServeArgs),
    /// Open one direct connection and print the server time
    Ping(commands::ping::PingArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = config::load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();
    match &dotenv {
        Some(path) => tracing::debug!("Loaded .env from {}", path.display()),
        None => tracing::debug!("No .env file found, using environment only"),
    }

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Ping(args) => commands::run_ping(args).await?,
    }
    Ok(())
}
