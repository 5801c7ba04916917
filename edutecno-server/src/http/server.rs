//! Axum server setup
//!
//! Server skeleton with:
//! - Request method logging and tracing middleware
//! - JSON 404/405 for unbound requests
//! - Graceful shutdown, then pool teardown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{dispatch, routes};
use crate::config::DatabaseConfig;
use crate::db::{DirectClient, PooledDb};
use crate::models::TableName;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    pub bind_addr: SocketAddr,

    /// Table read by the student routes (default: alumnos)
    pub students_table: TableName,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            students_table: TableName::default(),
        }
    }
}

/// Shared application state
///
/// Owns both database handles; injected into the router, never global.
#[derive(Clone)]
pub struct AppState {
    pub pooled: PooledDb,
    pub direct: DirectClient,
    pub students_table: TableName,
}

impl AppState {
    pub fn new(db: &DatabaseConfig, students_table: TableName) -> Self {
        Self {
            pooled: PooledDb::new(db),
            direct: DirectClient::new(db),
            students_table,
        }
    }
}

/// Build the router with every route binding.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::clock::router())
        .merge(routes::students::router())
        .fallback(dispatch::not_found)
        .layer(middleware::from_fn(dispatch::log_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl+C or SIGTERM, then close the pool.
///
/// # Example
///
/// ```ignore
/// let db = DatabaseConfig::from_url(&database_url)?;
/// run_server(&db, ServerConfig::default()).await?;
/// ```
pub async fn run_server(db: &DatabaseConfig, config: ServerConfig) -> Result<(), ServerError> {
    let state = Arc::new(AppState::new(db, config.students_table.clone()));
    tracing::info!(
        max_connections = db.max_connections(),
        students_table = %config.students_table,
        "Database access configured"
    );

    let app = build_router(Arc::clone(&state));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.pooled.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
