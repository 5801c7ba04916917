//! Database error type

use std::time::Duration;

/// Failure taxonomy for both acquisition strategies
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("could not connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("connecting to database timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("no pooled connection became available within {0:?}")]
    PoolExhausted(Duration),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("query timed out after {0:?}")]
    QueryTimeout(Duration),

    #[error("statement expects {expected} parameter(s), got {actual}")]
    ParameterMismatch { expected: usize, actual: usize },
}

impl DbError {
    /// Classify an error raised while acquiring or opening a connection.
    pub(crate) fn from_acquire(err: sqlx::Error, timeout: Duration) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::PoolExhausted(timeout),
            other => Self::Connect(other),
        }
    }

    /// True when the database could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::PoolExhausted(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout(_) | Self::QueryTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_exhaustion() {
        let err = DbError::from_acquire(sqlx::Error::PoolTimedOut, Duration::from_secs(5));
        assert!(matches!(err, DbError::PoolExhausted(_)));
        assert!(err.is_unavailable());
    }

    #[test]
    fn other_acquire_errors_are_connect() {
        let err = DbError::from_acquire(sqlx::Error::PoolClosed, Duration::from_secs(5));
        assert!(matches!(err, DbError::Connect(_)));
        assert!(!err.is_timeout());
    }

    #[test]
    fn mismatch_display() {
        let err = DbError::ParameterMismatch {
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "statement expects 2 parameter(s), got 1");
    }
}
