//! HTTP API for the organization registry
//!
//! Endpoint modules:
//! - `organization_endpoints`: health check and CRUD
//! - `tree_endpoints`: ancestor and descendant traversal
//!
//! Everything except `/health` sits behind token authentication.
//!
//! # SQLite Write Serialization
//!
//! The `write_lock` mutex serializes create, update, replace and delete
//! requests to reduce SQLite write contention. Reads never take it and run
//! concurrently.

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::config::{ApiTokens, ServerConfig};
use orgunits_core::OrganizationService;

mod auth;
mod http_error;
mod organization_endpoints;
mod tree_endpoints;

pub use auth::parse_authorization;
pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub service: OrganizationService,
    pub tokens: Arc<ApiTokens>,
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(service: OrganizationService, tokens: ApiTokens) -> Self {
        Self {
            service,
            tokens: Arc::new(tokens),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(organization_endpoints::routes())
        .merge(tree_endpoints::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/health", get(organization_endpoints::health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until ctrl-c
///
/// # Errors
///
/// Returns error if the listener fails to bind or the server fails.
pub async fn start_server(config: &ServerConfig, service: OrganizationService) -> anyhow::Result<()> {
    let state = AppState::new(service, config.api_tokens.clone());
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);
    tracing::info!("{} API token(s) configured", config.api_tokens.len());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
