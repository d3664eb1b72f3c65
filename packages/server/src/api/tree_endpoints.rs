//! Hierarchy traversal endpoints
//!
//! - `GET /organizations/:id/ancestors` - Strict ancestors ordered by name
//! - `GET /organizations/:id/descendants` - Strict descendants ordered by name
//!
//! The core returns an empty set for unknown ids; these handlers check
//! existence first so callers get a 404 instead.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::Json,
    routing::get,
    Router,
};

use crate::api::{AppState, HttpError};
use orgunits_core::Organization;

async fn ensure_exists(state: &AppState, id: i64) -> Result<(), HttpError> {
    if state.service.exists(id).await? {
        Ok(())
    } else {
        Err(HttpError::not_found(id))
    }
}

async fn ancestors(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Organization>>, HttpError> {
    let Path(id) = path?;
    ensure_exists(&state, id).await?;
    let result = state.service.tree().strict_ancestors(id).await?;
    tracing::debug!(id, count = result.len(), "ancestors");
    Ok(Json(result))
}

async fn descendants(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Organization>>, HttpError> {
    let Path(id) = path?;
    ensure_exists(&state, id).await?;
    let result = state.service.tree().strict_descendants(id).await?;
    tracing::debug!(id, count = result.len(), "descendants");
    Ok(Json(result))
}

/// Authenticated traversal routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations/:id/ancestors", get(ancestors))
        .route("/organizations/:id/descendants", get(descendants))
}
