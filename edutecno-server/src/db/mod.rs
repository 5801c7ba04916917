//! Database access layer - pooled and direct strategies
//!
//! # Design Principles
//!
//! - One owned pool per process, injected through `AppState`, never global
//! - Direct connections are exclusively owned by one request
//! - Every acquisition is scoped: returned or closed on every exit path
//! - Connect, acquire, query and close are all bounded by timeouts

pub mod direct;
pub mod error;
pub mod pool;
pub mod query;
pub mod scoped;

pub use direct::{DirectClient, DirectConnection};
pub use error::DbError;
pub use pool::PooledDb;
pub use query::{JsonRow, QueryRequest, QueryResult, SqlParam};
pub use scoped::{ConnectionSource, ScopedConnection};

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use crate::config::{Credentials, DatabaseConfig};

    /// Points at a closed local port: connects are refused immediately.
    pub fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig::from_credentials(Credentials {
            host: "127.0.0.1".into(),
            port: 1,
            database: "edutecno".into(),
            user: "postgres".into(),
            password: None,
        })
        .with_max_connections(2)
        .and_then(|c| c.with_connect_timeout(Duration::from_millis(500)))
        .expect("valid test config")
    }

    pub fn database_url() -> String {
        std::env::var("DATABASE_URL").expect("DATABASE_URL required")
    }
}
