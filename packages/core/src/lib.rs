//! OrgUnits Core
//!
//! This crate provides the organization hierarchy store and the recursive
//! tree query engine behind the OrgUnits HTTP API.
//!
//! # Architecture
//!
//! - **Forest model**: Every organization has at most one parent
//! - **libsql/Turso**: Embedded SQLite-compatible database
//! - **Single-read traversal**: Ancestor and descendant closures are computed
//!   by the store in one statement, never by a caller-side loop
//! - **Injected store**: Services take an `Arc<dyn OrganizationStore>`
//!
//! # Modules
//!
//! - [`models`] - Data structures (Organization, NewOrganization, ...)
//! - [`db`] - Database layer and store implementations
//! - [`services`] - TreeQueryEngine and OrganizationService

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::{DatabaseService, MemoryStore, OrganizationStore, TursoStore};
pub use models::*;
pub use services::*;
