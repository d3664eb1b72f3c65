//! Organization CRUD endpoints
//!
//! - `GET /health` - Health check (no authentication)
//! - `GET /organizations` - List organizations ordered by name
//! - `POST /organizations` - Create an organization
//! - `GET /organizations/:id` - Get an organization
//! - `PUT /organizations/:id` - Replace an organization
//! - `PATCH /organizations/:id` - Partially update an organization
//! - `DELETE /organizations/:id` - Delete an organization

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::api::{AppState, HttpError};
use orgunits_core::{NewOrganization, Organization, OrganizationUpdate};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Organization>>, HttpError> {
    Ok(Json(state.service.list().await?))
}

async fn create_organization(
    State(state): State<AppState>,
    payload: Result<Json<NewOrganization>, JsonRejection>,
) -> Result<(StatusCode, Json<Organization>), HttpError> {
    let Json(new) = payload?;
    let _guard = state.write_lock.lock().await;

    let created = state.service.create(new).await.inspect_err(|e| {
        tracing::error!(error = %e, "create organization failed");
    })?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_organization(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Organization>, HttpError> {
    let Path(id) = path?;
    Ok(Json(state.service.get(id).await?))
}

async fn replace_organization(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewOrganization>, JsonRejection>,
) -> Result<Json<Organization>, HttpError> {
    let Path(id) = path?;
    let Json(replacement) = payload?;
    let _guard = state.write_lock.lock().await;

    let updated = state
        .service
        .replace(id, replacement)
        .await
        .inspect_err(|e| tracing::error!(id, error = %e, "replace organization failed"))?;

    Ok(Json(updated))
}

async fn update_organization(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<OrganizationUpdate>, JsonRejection>,
) -> Result<Json<Organization>, HttpError> {
    let Path(id) = path?;
    let Json(update) = payload?;
    let _guard = state.write_lock.lock().await;

    let updated = state
        .service
        .update(id, update)
        .await
        .inspect_err(|e| tracing::error!(id, error = %e, "update organization failed"))?;

    Ok(Json(updated))
}

async fn delete_organization(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, HttpError> {
    let Path(id) = path?;
    let _guard = state.write_lock.lock().await;

    state
        .service
        .delete(id)
        .await
        .inspect_err(|e| tracing::error!(id, error = %e, "delete organization failed"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Authenticated CRUD routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations",
            get(list_organizations).post(create_organization),
        )
        .route(
            "/organizations/:id",
            get(get_organization)
                .put(replace_organization)
                .patch(update_organization)
                .delete(delete_organization),
        )
}
