//! HTTP layer - request dispatcher and route handlers
//!
//! Axum server with:
//! - Fixed (method, path) route bindings
//! - Request logging
//! - Graceful shutdown
//! - JSON error responses

pub mod dispatch;
pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
