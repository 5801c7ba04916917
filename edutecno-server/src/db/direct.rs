//! Direct strategy: one dedicated connection per acquisition
//!
//! The caller sequences connect → query → close, but the handle makes the
//! last step impossible to skip: [`DirectConnection::close`] consumes it,
//! and dropping it unclosed still terminates the session and decrements
//! the open-connection gauge.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{Connection, PgConnection};

use super::scoped::{execute, ConnectionSource, ScopedConnection};
use super::{DbError, QueryRequest, QueryResult};
use crate::config::DatabaseConfig;

/// Factory for per-request connections
#[derive(Clone)]
pub struct DirectClient {
    config: DatabaseConfig,
    open: Arc<AtomicUsize>,
}

impl DirectClient {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            config: config.clone(),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Direct connections currently open.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Open a new session, bounded by the connect timeout.
    pub async fn connect(&self) -> Result<DirectConnection, DbError> {
        let timeout = self.config.connect_timeout();
        let connect = PgConnection::connect_with(self.config.connect_options());

        let conn = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(err)) => return Err(DbError::Connect(err)),
            Err(_) => return Err(DbError::ConnectTimeout(timeout)),
        };

        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(open, "direct connection opened");

        Ok(DirectConnection {
            conn,
            guard: OpenGuard {
                open: Arc::clone(&self.open),
                closed: false,
            },
            query_timeout: self.config.query_timeout(),
            close_timeout: timeout,
        })
    }

    /// Connect, run `f`, and close on every exit path.
    ///
    /// ```ignore
    /// let request = QueryRequest::simple("SELECT NOW()")?;
    /// let rows = client
    ///     .with_connection(move |conn| Box::pin(async move { conn.query(&request).await }))
    ///     .await?;
    /// ```
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: for<'c> FnOnce(&'c mut DirectConnection) -> BoxFuture<'c, Result<T, DbError>> + Send,
        T: Send,
    {
        let mut conn = self.connect().await?;
        let result = f(&mut conn).await;
        conn.close().await;
        result
    }
}

#[async_trait]
impl ConnectionSource for DirectClient {
    fn label(&self) -> &'static str {
        "direct"
    }

    async fn acquire(&self) -> Result<ScopedConnection, DbError> {
        self.connect().await.map(ScopedConnection::Direct)
    }
}

/// Decrements the gauge exactly once, however the connection goes away
struct OpenGuard {
    open: Arc<AtomicUsize>,
    closed: bool,
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        let remaining = self.open.fetch_sub(1, Ordering::SeqCst) - 1;
        if !self.closed {
            tracing::warn!(open = remaining, "direct connection dropped without close");
        }
    }
}

/// Exclusively owned session; never shared between requests
pub struct DirectConnection {
    conn: PgConnection,
    guard: OpenGuard,
    query_timeout: Duration,
    close_timeout: Duration,
}

impl DirectConnection {
    pub async fn query(&mut self, request: &QueryRequest) -> Result<QueryResult, DbError> {
        execute(&mut self.conn, request, self.query_timeout).await
    }

    /// Terminate the session gracefully. Failures are logged, not returned:
    /// by the time a handler closes, its response is already decided.
    pub async fn close(self) {
        let Self {
            conn,
            mut guard,
            close_timeout,
            ..
        } = self;

        match tokio::time::timeout(close_timeout, conn.close()).await {
            Ok(Ok(())) => tracing::info!("direct connection closed"),
            Ok(Err(err)) => tracing::warn!("error closing direct connection: {}", err),
            Err(_) => tracing::warn!(?close_timeout, "closing direct connection timed out"),
        }
        guard.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{database_url, unreachable_config};

    #[tokio::test]
    async fn failed_connect_leaves_gauge_at_baseline() {
        let client = DirectClient::new(&unreachable_config());
        assert_eq!(client.open_connections(), 0);

        let err = client.connect().await.err().expect("connect should fail");
        assert!(err.is_unavailable() || err.is_timeout(), "unexpected error: {err:?}");
        assert_eq!(client.open_connections(), 0);
    }

    #[tokio::test]
    async fn with_connection_propagates_connect_error() {
        let client = DirectClient::new(&unreachable_config());
        let request = QueryRequest::simple("SELECT NOW()").unwrap();

        let result = client
            .with_connection(move |conn| Box::pin(async move { conn.query(&request).await }))
            .await;

        assert!(result.is_err());
        assert_eq!(client.open_connections(), 0);
    }

    #[test]
    fn guard_decrements_once() {
        let open = Arc::new(AtomicUsize::new(1));
        let guard = OpenGuard {
            open: Arc::clone(&open),
            closed: true,
        };
        drop(guard);
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p edutecno-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn query_then_close_returns_to_baseline() {
        let config = DatabaseConfig::from_url(&database_url()).expect("bad DATABASE_URL");
        let client = DirectClient::new(&config);

        let mut conn = client.connect().await.expect("connect failed");
        assert_eq!(client.open_connections(), 1);

        let result = conn
            .query(&QueryRequest::simple("SELECT NOW()").unwrap())
            .await
            .expect("query failed");
        assert_eq!(result.len(), 1);

        conn.close().await;
        assert_eq!(client.open_connections(), 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn failing_query_still_closes() {
        let config = DatabaseConfig::from_url(&database_url()).expect("bad DATABASE_URL");
        let client = DirectClient::new(&config);

        let request = QueryRequest::simple("SELECT * FROM table_that_does_not_exist").unwrap();
        let err = client.query(&request).await.unwrap_err();

        assert!(matches!(err, DbError::Query(_)));
        assert_eq!(client.open_connections(), 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn dropped_handle_is_not_leaked() {
        let config = DatabaseConfig::from_url(&database_url()).expect("bad DATABASE_URL");
        let client = DirectClient::new(&config);

        {
            let _conn = client.connect().await.expect("connect failed");
            assert_eq!(client.open_connections(), 1);
        }
        assert_eq!(client.open_connections(), 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn query_timeout_closes_connection() {
        let config = DatabaseConfig::from_url(&database_url())
            .and_then(|c| c.with_query_timeout(Duration::from_millis(100)))
            .expect("bad DATABASE_URL");
        let client = DirectClient::new(&config);

        let request = QueryRequest::simple("SELECT pg_sleep(2)").unwrap();
        let err = client.query(&request).await.unwrap_err();

        assert!(matches!(err, DbError::QueryTimeout(_)));
        assert_eq!(client.open_connections(), 0);
    }
}
