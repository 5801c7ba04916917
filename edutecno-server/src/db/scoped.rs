//! Scoped acquisition shared by both strategies
//!
//! A [`ScopedConnection`] is released exactly once: explicitly through
//! [`ScopedConnection::release`], or by `Drop` on early return, `?`,
//! timeout or cancellation. Pooled handles go back to the pool, direct
//! handles are closed. A pooled handle whose statement timed out is closed
//! instead of returned.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, Postgres};

use super::direct::DirectConnection;
use super::{DbError, QueryRequest, QueryResult};

/// Connection checked out from either strategy
pub enum ScopedConnection {
    Pooled {
        conn: PoolConnection<Postgres>,
        query_timeout: Duration,
    },
    Direct(DirectConnection),
}

impl ScopedConnection {
    /// Run one statement on this connection.
    pub async fn query(&mut self, request: &QueryRequest) -> Result<QueryResult, DbError> {
        match self {
            Self::Pooled {
                conn,
                query_timeout,
            } => {
                let result = execute(&mut **conn, request, *query_timeout).await;
                // The server may still be running the abandoned statement.
                if matches!(result, Err(DbError::QueryTimeout(_))) {
                    conn.close_on_drop();
                }
                result
            }
            Self::Direct(conn) => conn.query(request).await,
        }
    }

    /// Return the connection to its owner: back to the pool, or closed.
    pub async fn release(self) {
        match self {
            Self::Pooled { conn, .. } => drop(conn),
            Self::Direct(conn) => conn.close().await,
        }
    }
}

/// Where connections come from
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    /// Strategy name for logs.
    fn label(&self) -> &'static str;

    /// Acquire a connection, bounded by the connect timeout.
    async fn acquire(&self) -> Result<ScopedConnection, DbError>;

    /// Acquire, run one statement, release; the release happens whether the
    /// statement succeeded, failed or timed out.
    async fn query(&self, request: &QueryRequest) -> Result<QueryResult, DbError> {
        let mut conn = self.acquire().await?;
        let result = conn.query(request).await;
        conn.release().await;

        match &result {
            Ok(rows) => tracing::debug!(strategy = self.label(), rows = rows.len(), "query complete"),
            Err(err) => tracing::debug!(strategy = self.label(), "query failed: {}", err),
        }
        result
    }
}

/// Execute `request` on a live connection, bounded by `timeout`.
pub(crate) async fn execute(
    conn: &mut PgConnection,
    request: &QueryRequest,
    timeout: Duration,
) -> Result<QueryResult, DbError> {
    tracing::debug!(sql = request.sql(), params = request.params().len(), "executing statement");

    match tokio::time::timeout(timeout, request.to_query().fetch_all(conn)).await {
        Ok(Ok(rows)) => Ok(QueryResult::from_rows(&rows)),
        Ok(Err(err)) => Err(DbError::Query(err)),
        Err(_) => Err(DbError::QueryTimeout(timeout)),
    }
}
