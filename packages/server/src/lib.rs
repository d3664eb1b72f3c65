//! OrgUnits Server
//!
//! Authenticated HTTP API over the `orgunits-core` organization registry.

pub mod api;
pub mod config;

pub use api::{create_router, start_server, AppState, HttpError};
pub use config::{ApiTokens, ConfigError, ServerConfig};
