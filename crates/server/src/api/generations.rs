//! Session listing and retrieval.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use crate::auth::authenticate;
use crate::error::ServerError;

/// Query parameters for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

/// `GET /api/generations` -- the caller's sessions, newest first.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let user_id = authenticate(&headers, &state.config.auth)?;
    debug!(user = %user_id, limit = query.limit, "listing generations");

    let generations = state.store.list_sessions(&user_id, query.limit).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user_id": user_id,
        "count": generations.len(),
        "generations": generations,
    })))
}

/// `GET /api/generations/{id}` -- one session with its images.
///
/// A session owned by another user is reported as not found.
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(generation_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let user_id = authenticate(&headers, &state.config.auth)?;

    let generation = state
        .store
        .get(&generation_id, Some(&user_id))
        .await?
        .ok_or_else(|| {
            ServerError::NotFound("generation not found or access denied".to_owned())
        })?;

    Ok(Json(serde_json::json!({
        "success": true,
        "generation": generation,
    })))
}
