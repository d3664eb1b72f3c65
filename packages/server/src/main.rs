//! OrgUnits HTTP Server Binary
//!
//! # Usage
//!
//! ```bash
//! ORGUNITS_API_TOKENS=secret cargo run --bin orgunits-server
//!
//! # Custom port and database
//! ORGUNITS_PORT=3002 ORGUNITS_DB_PATH=/tmp/org.db ORGUNITS_API_TOKENS=a,b \
//!     cargo run --bin orgunits-server
//! ```
//!
//! # Environment Variables
//!
//! - `ORGUNITS_HOST`: Bind address (default: 127.0.0.1)
//! - `ORGUNITS_PORT`: Server port (default: 3001)
//! - `ORGUNITS_DB_PATH`: Database file (default: ~/.orgunits/database/orgunits.db)
//! - `ORGUNITS_API_TOKENS`: Comma-separated API tokens (required)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::sync::Arc;

use orgunits_core::{DatabaseService, OrganizationService, OrganizationStore, TursoStore};
use orgunits_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("OrgUnits HTTP Server");

    let config = ServerConfig::from_env()?;
    tracing::info!("Database: {}", config.db_path.display());

    let db = Arc::new(DatabaseService::new(config.db_path.clone()).await?);
    let store: Arc<dyn OrganizationStore> = Arc::new(TursoStore::new(db));
    let service = OrganizationService::new(store.clone());
    tracing::info!("Services initialized");

    let served = start_server(&config, service).await;

    store.close().await?;
    served
}
