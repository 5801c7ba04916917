//! edutecno-server: JSON over PostgreSQL, one query per route
//!
//! Two ways of reaching the database live side by side:
//! - a shared sqlx pool ([`db::PooledDb`]) for the stateless routes
//! - a fresh connection per request ([`db::DirectClient`]) that is closed
//!   on every exit path
//!
//! Both hand out scoped connections (see [`db::ConnectionSource`]), so a
//! handler can never leave a session behind.

pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::{ConfigError, Credentials, DatabaseConfig};
pub use http::{build_router, run_server, AppState, ServerConfig};
