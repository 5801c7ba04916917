//! Database connection pool management
//!
//! Uses sqlx PgPool with an explicit connection limit. Connections are opened
//! lazily, so the server starts even if the database is down and every
//! request then fails fast with an explicit error instead of hanging.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::scoped::{ConnectionSource, ScopedConnection};
use super::DbError;
use crate::config::DatabaseConfig;

/// Process-wide pool shared by all requests
#[derive(Clone)]
pub struct PooledDb {
    pool: PgPool,
    config: DatabaseConfig,
}

impl PooledDb {
    /// Create the pool. No connection is opened until the first acquire.
    pub fn new(config: &DatabaseConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.connect_timeout())
            .connect_lazy_with(config.connect_options().clone());

        Self {
            pool,
            config: config.clone(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connections currently open, idle or checked out.
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    pub fn idle(&self) -> usize {
        self.pool.num_idle()
    }

    pub fn max_connections(&self) -> u32 {
        self.config.max_connections()
    }

    /// Tear the pool down, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

#[async_trait]
impl ConnectionSource for PooledDb {
    fn label(&self) -> &'static str {
        "pooled"
    }

    /// Check out a connection; it returns to the pool when the handle is
    /// released or dropped.
    async fn acquire(&self) -> Result<ScopedConnection, DbError> {
        let timeout = self.config.connect_timeout();
        match tokio::time::timeout(timeout, self.pool.acquire()).await {
            Ok(Ok(conn)) => Ok(ScopedConnection::Pooled {
                conn,
                query_timeout: self.config.query_timeout(),
            }),
            Ok(Err(err)) => Err(DbError::from_acquire(err, timeout)),
            Err(_) => Err(DbError::PoolExhausted(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::test_support::{database_url, unreachable_config};
    use crate::db::{QueryRequest, SqlParam};

    #[tokio::test]
    async fn lazy_pool_starts_empty() {
        let db = PooledDb::new(&unreachable_config());
        assert_eq!(db.size(), 0);
        assert_eq!(db.idle(), 0);
        assert_eq!(db.max_connections(), 2);
    }

    #[tokio::test]
    async fn unreachable_database_fails_fast() {
        let db = PooledDb::new(&unreachable_config());
        let request = QueryRequest::simple("SELECT NOW()").unwrap();

        let started = std::time::Instant::now();
        let err = db.query(&request).await.unwrap_err();

        assert!(err.is_unavailable(), "unexpected error: {err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(db.size(), 0);
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p edutecno-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_runs_query() {
        let config = DatabaseConfig::from_url(&database_url()).expect("bad DATABASE_URL");
        let db = PooledDb::new(&config);

        let request = QueryRequest::new("SELECT $1::int AS n", vec![7.into()]).unwrap();
        let result = db.query(&request).await.expect("query failed");

        assert_eq!(result.rows()[0]["n"], 7);
        assert!(db.size() <= db.max_connections());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrency_beyond_capacity_queues() {
        let config = DatabaseConfig::from_url(&database_url())
            .and_then(|c| c.with_max_connections(3))
            .and_then(|c| c.with_connect_timeout(Duration::from_secs(30)))
            .expect("bad DATABASE_URL");
        let db = PooledDb::new(&config);

        // Each query holds its connection long enough for the others to queue.
        let handles: Vec<_> = (0..12)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move {
                    let request = QueryRequest::new(
                        "SELECT $1::int AS n FROM (SELECT pg_sleep(0.05)) AS s",
                        vec![SqlParam::Int(i)],
                    )
                    .unwrap();
                    let result = db.query(&request).await.expect("concurrent query failed");
                    assert!(db.size() <= 3);
                    result.rows()[0]["n"].as_i64().unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let n = handle.await.expect("task panicked");
            assert_eq!(n, i as i64);
        }
        assert!(db.size() <= 3);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn timed_out_connection_is_not_reused() {
        let config = DatabaseConfig::from_url(&database_url())
            .and_then(|c| c.with_max_connections(1))
            .and_then(|c| c.with_query_timeout(Duration::from_millis(100)))
            .expect("bad DATABASE_URL");
        let db = PooledDb::new(&config);

        let slow = QueryRequest::simple("SELECT pg_sleep(3)").unwrap();
        let err = db.query(&slow).await.unwrap_err();
        assert!(matches!(err, DbError::QueryTimeout(_)));

        // With a single slot, a reused session would wait out the sleep.
        let started = std::time::Instant::now();
        let fast = QueryRequest::simple("SELECT 42 AS n").unwrap();
        let result = db.query(&fast).await.expect("follow-up query failed");

        assert_eq!(result.rows()[0]["n"], 42);
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "follow-up query took {:?}",
            started.elapsed()
        );
        assert!(db.size() <= 1);
    }
}
