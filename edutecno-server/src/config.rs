//! Database configuration
//!
//! Credentials are always injected: either a `DATABASE_URL` or discrete
//! host/port/database/user/password values. Nothing here is hard-coded
//! beyond pool sizing and timeout defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::models::ValidationError;

/// Default pool capacity (matches node-postgres' default of 10).
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default bound on connect and pool acquire.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a single query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid database url: {0}")]
    InvalidUrl(#[source] sqlx::Error),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Discrete connection credentials
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Connection settings shared by the pooled and direct strategies
#[derive(Clone)]
pub struct DatabaseConfig {
    connect_options: PgConnectOptions,
    max_connections: u32,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl DatabaseConfig {
    /// Build from a `postgres://` connection string.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let connect_options = PgConnectOptions::from_str(url).map_err(ConfigError::InvalidUrl)?;
        Ok(Self::from_options(connect_options))
    }

    /// Build from discrete credentials.
    pub fn from_credentials(credentials: Credentials) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .database(&credentials.database)
            .username(&credentials.user);

        if let Some(password) = &credentials.password {
            options = options.password(password);
        }

        Self::from_options(options)
    }

    fn from_options(connect_options: PgConnectOptions) -> Self {
        Self {
            connect_options,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Set the pool capacity.
    pub fn with_max_connections(mut self, max_connections: u32) -> Result<Self, ConfigError> {
        if max_connections == 0 {
            return Err(ConfigError::Zero {
                field: "max_connections",
            });
        }
        self.max_connections = max_connections;
        Ok(self)
    }

    /// Set the bound on connect, pool acquire and close.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::Zero {
                field: "connect_timeout",
            });
        }
        self.connect_timeout = timeout;
        Ok(self)
    }

    /// Set the bound on a single query.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::Zero {
                field: "query_timeout",
            });
        }
        self.query_timeout = timeout;
        Ok(self)
    }

    pub fn connect_options(&self) -> &PgConnectOptions {
        &self.connect_options
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}

// PgConnectOptions' own Debug output includes the password.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.connect_options.get_host())
            .field("port", &self.connect_options.get_port())
            .field("database", &self.connect_options.get_database())
            .field("user", &self.connect_options.get_username())
            .field("max_connections", &self.max_connections)
            .field("connect_timeout", &self.connect_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            host: "db.internal".into(),
            port: 5433,
            database: "edutecno".into(),
            user: "postgres".into(),
            password: Some("s3cret".into()),
        }
    }

    #[test]
    fn from_url_reads_components() {
        let config = DatabaseConfig::from_url("postgres://app:pw@localhost:5432/edutecno").unwrap();
        let options = config.connect_options();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("edutecno"));
        assert_eq!(options.get_username(), "app");
    }

    #[test]
    fn from_url_rejects_garbage() {
        let err = DatabaseConfig::from_url("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = DatabaseConfig::from_credentials(credentials());
        assert_eq!(config.max_connections(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.query_timeout(), DEFAULT_QUERY_TIMEOUT);
        assert_eq!(config.connect_options().get_port(), 5433);
    }

    #[test]
    fn zero_values_rejected() {
        let config = DatabaseConfig::from_credentials(credentials());
        assert!(matches!(
            config.clone().with_max_connections(0),
            Err(ConfigError::Zero { field: "max_connections" })
        ));
        assert!(config.clone().with_connect_timeout(Duration::ZERO).is_err());
        assert!(config.with_query_timeout(Duration::ZERO).is_err());
    }

    #[test]
    fn debug_hides_password() {
        let config = DatabaseConfig::from_credentials(credentials());
        let rendered = format!("{:?} {:?}", config, credentials());
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("db.internal"));
    }
}
