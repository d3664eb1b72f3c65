//! Database Layer
//!
//! This module handles persistence of organizations:
//!
//! - Database initialization and connection management (libsql)
//! - The `OrganizationStore` abstraction injected into services
//! - A SQLite-backed store and an in-memory store with identical semantics
//!
//! # Integrity
//!
//! Both stores enforce the same rules: `code` is unique, `parent_id` must
//! point at an existing organization, and a referenced parent cannot be
//! deleted. Acyclicity is not enforced; traversal tolerates cycles instead.

mod database;
mod error;
mod memory_store;
mod organization_store;
mod turso_store;

pub use database::{DatabaseService, DbOrganizationParams, DbOrganizationPatch};
pub use error::DatabaseError;
pub use memory_store::MemoryStore;
pub use organization_store::OrganizationStore;
pub use turso_store::TursoStore;
