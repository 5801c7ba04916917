//! Student table routes

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::{ConnectionSource, QueryRequest, QueryResult, SqlParam};
use crate::http::dispatch::method_not_allowed;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::TableName;

/// Ids selected by the parameterized route
const SELECTED_IDS: [i32; 2] = [1, 2];

fn by_id_request(table: &TableName) -> Result<QueryRequest, ApiError> {
    let sql = format!("SELECT * FROM {} WHERE id = $1 OR id = $2", table);
    let params = SELECTED_IDS.iter().copied().map(SqlParam::Int).collect();
    Ok(QueryRequest::new(sql, params)?)
}

fn all_request(table: &TableName) -> Result<QueryRequest, ApiError> {
    Ok(QueryRequest::simple(format!("SELECT * FROM {}", table))?)
}

/// GET /query-con-parametro - rows with id 1 or 2, ids bound as parameters
async fn students_by_id(State(state): State<Arc<AppState>>) -> Result<Json<QueryResult>, ApiError> {
    let request = by_id_request(&state.students_table)?;
    let result = state.pooled.query(&request).await?;

    tracing::debug!(rows = result.len(), "students by id");
    Ok(Json(result))
}

/// GET /query-funcion-asincronica - every row of the students table
async fn all_students(State(state): State<Arc<AppState>>) -> Result<Json<QueryResult>, ApiError> {
    let request = all_request(&state.students_table)?;
    let result = state.pooled.query(&request).await?;

    tracing::debug!(rows = result.len(), "all students");
    Ok(Json(result))
}

/// Student routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/query-con-parametro",
            get(students_by_id).fallback(method_not_allowed),
        )
        .route(
            "/query-funcion-asincronica",
            get(all_students).fallback(method_not_allowed),
        )
}
