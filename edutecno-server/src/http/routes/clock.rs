//! Current database time, through each acquisition strategy

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::{ConnectionSource, JsonRow, QueryRequest, QueryResult};
use crate::http::dispatch::method_not_allowed;
use crate::http::error::ApiError;
use crate::http::server::AppState;

const CURRENT_TIME_SQL: &str = "SELECT NOW()";

/// GET /hora-actual - first row of `SELECT NOW()` over the pool
async fn current_time(State(state): State<Arc<AppState>>) -> Result<Json<JsonRow>, ApiError> {
    let request = QueryRequest::simple(CURRENT_TIME_SQL)?;
    let row = state
        .pooled
        .query(&request)
        .await?
        .into_first()
        .ok_or_else(|| ApiError::Internal {
            message: format!("{} returned no rows", CURRENT_TIME_SQL),
        })?;

    tracing::debug!(?row, "current time");
    Ok(Json(row))
}

/// GET /hora-actual-cliente - all rows of `SELECT NOW()` over a fresh
/// connection, closed before the response is sent
async fn current_time_direct(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QueryResult>, ApiError> {
    let request = QueryRequest::simple(CURRENT_TIME_SQL)?;
    let result = state.direct.query(&request).await?;

    tracing::debug!(rows = result.len(), "current time (direct)");
    Ok(Json(result))
}

/// Clock routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/hora-actual",
            get(current_time).fallback(method_not_allowed),
        )
        .route(
            "/hora-actual-cliente",
            get(current_time_direct).fallback(method_not_allowed),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::unreachable_config;
    use crate::models::TableName;

    fn unreachable_state() -> Arc<AppState> {
        Arc::new(AppState::new(&unreachable_config(), TableName::default()))
    }

    #[tokio::test]
    async fn pooled_route_reports_unavailable() {
        let err = current_time(State(unreachable_state())).await.unwrap_err();
        assert!(matches!(err, ApiError::Database(ref e) if e.is_unavailable()));
    }

    #[tokio::test]
    async fn direct_route_reports_unavailable_without_leaking() {
        let state = unreachable_state();
        let err = current_time_direct(State(Arc::clone(&state))).await.unwrap_err();

        assert!(matches!(err, ApiError::Database(_)));
        assert_eq!(state.direct.open_connections(), 0);
    }
}
