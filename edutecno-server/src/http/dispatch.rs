//! Request dispatch edges: method logging and unmatched requests
//!
//! Every request is logged before it reaches a handler. A request that
//! matches no route is answered with 404 instead of being left hanging.

use axum::extract::Request;
use axum::http::{Method, Uri};
use axum::middleware::Next;
use axum::response::Response;

use super::error::ApiError;

/// Log the method and path of every received request.
pub async fn log_request(request: Request, next: Next) -> Response {
    tracing::info!(method = %request.method(), path = %request.uri().path(), "request received");
    next.run(request).await
}

/// Fallback for paths with no binding.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        resource: "route",
        id: uri.path().to_owned(),
    }
}

/// Fallback for bound paths hit with an unbound method.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed { method }
}
