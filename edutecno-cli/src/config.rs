//! Configuration loading: `.env` files and database arguments
//!
//! Every database setting can come from a flag, from the environment, or
//! from a `.env` file in the current directory. `DATABASE_URL` wins over
//! the discrete `PG*` values when both are present.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use edutecno_server::config::DEFAULT_MAX_CONNECTIONS;
use edutecno_server::{ConfigError, Credentials, DatabaseConfig};

/// Load `.env` from the current directory, if any.
///
/// Runs before argument parsing so `env = ...` defaults see the values;
/// dotenvy never overwrites variables that are already set.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Database connection arguments shared by every command
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database URL (takes precedence over the discrete settings below)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Database host
    #[arg(long, env = "PGHOST", default_value = "localhost")]
    pub db_host: String,

    /// Database port
    #[arg(long, env = "PGPORT", default_value_t = 5432)]
    pub db_port: u16,

    /// Database name
    #[arg(long, env = "PGDATABASE", default_value = "edutecno")]
    pub db_name: String,

    /// Database user
    #[arg(long, env = "PGUSER", default_value = "postgres")]
    pub db_user: String,

    /// Database password
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Maximum pooled connections
    #[arg(long, env = "EDUTECNO_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Seconds to wait for a connection (connect, pool acquire, close)
    #[arg(long, env = "EDUTECNO_CONNECT_TIMEOUT", default_value_t = 5)]
    pub connect_timeout: u64,

    /// Seconds to wait for a single query
    #[arg(long, env = "EDUTECNO_QUERY_TIMEOUT", default_value_t = 10)]
    pub query_timeout: u64,
}

impl DatabaseArgs {
    pub fn to_config(&self) -> Result<DatabaseConfig, ConfigError> {
        let base = match &self.database_url {
            Some(url) => DatabaseConfig::from_url(url)?,
            None => DatabaseConfig::from_credentials(Credentials {
                host: self.db_host.clone(),
                port: self.db_port,
                database: self.db_name.clone(),
                user: self.db_user.clone(),
                password: self.db_password.clone(),
            }),
        };

        base.with_max_connections(self.max_connections)?
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))?
            .with_query_timeout(Duration::from_secs(self.query_timeout))
    }
}
