//! Health check endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::dispatch::method_not_allowed;
use crate::http::server::AppState;

/// Pool occupancy
#[derive(Serialize)]
pub struct PoolHealth {
    pub size: u32,
    pub idle: usize,
    pub max_connections: u32,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub pool: PoolHealth,
    pub direct_open: usize,
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pool: PoolHealth {
            size: state.pooled.size(),
            idle: state.pooled.idle(),
            max_connections: state.pooled.max_connections(),
        },
        direct_open: state.direct.open_connections(),
    })
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health).fallback(method_not_allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::unreachable_config;
    use crate::models::TableName;

    #[tokio::test]
    async fn health_returns_ok() {
        let state = Arc::new(AppState::new(&unreachable_config(), TableName::default()));
        let Json(body) = health(State(state)).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.pool.size, 0);
        assert_eq!(body.pool.max_connections, 2);
        assert_eq!(body.direct_open, 0);
    }
}
