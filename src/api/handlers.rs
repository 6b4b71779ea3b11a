use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{error::AppResult, middleware::RequestId, models::SearchResponse};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Optional so a missing parameter gets our 400 body, not axum's rejection
    #[serde(default)]
    pub query: Option<String>,
}

/// Liveness probe
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Handler for `GET /search?query=...`
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let query = params.query.unwrap_or_default();

    tracing::info!(request_id = %request_id, query = %query, "Processing search request");

    let results = state.search.search(&query).await?;

    Ok(Json(SearchResponse { results }))
}
