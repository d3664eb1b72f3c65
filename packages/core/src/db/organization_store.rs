//! OrganizationStore Trait - Database Abstraction Layer
//!
//! This module defines the `OrganizationStore` trait that abstracts persistence
//! of organizations. Services receive the store as an injected
//! `Arc<dyn OrganizationStore>` rather than reaching for a global handle,
//! which lets tests swap in the in-memory implementation.
//!
//! # Implementations
//!
//! - [`TursoStore`](crate::db::TursoStore): libsql/SQLite, recursive CTE traversal
//! - [`MemoryStore`](crate::db::MemoryStore): in-process map, breadth-first traversal
//!
//! # Examples
//!
//! ```rust,no_run
//! use orgunits_core::db::{DatabaseService, OrganizationStore, TursoStore};
//! use orgunits_core::models::{NewOrganization, TraversalDirection};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/orgunits.db")).await?);
//!     let store: Arc<dyn OrganizationStore> = Arc::new(TursoStore::new(db));
//!
//!     let root = store.create_organization(NewOrganization::new("Root", "ROOT")).await?;
//!     let subtree = store.tree_closure(root.id, TraversalDirection::Downward).await?;
//!     assert_eq!(subtree.len(), 1);
//!     Ok(())
//! }
//! ```

use crate::models::{DeleteResult, NewOrganization, Organization, OrganizationUpdate, TraversalDirection};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for organization persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single store instance is shared by
/// every concurrent request.
///
/// # Integrity
///
/// Implementations must reject, with a
/// [`DatabaseError::ConstraintViolation`](crate::db::DatabaseError) in the
/// error chain:
/// - a duplicate `code` on create or update
/// - a `parent_id` that does not reference an existing organization
/// - deleting an organization that is still referenced as a parent
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Persist a new organization; the store assigns `id` and timestamps
    async fn create_organization(&self, new: NewOrganization) -> Result<Organization>;

    /// Get organization by id
    ///
    /// - `Ok(Some(org))` if it exists
    /// - `Ok(None)` if it doesn't (not an error)
    async fn get_organization(&self, id: i64) -> Result<Option<Organization>>;

    /// Get organization by its unique code
    async fn get_organization_by_code(&self, code: &str) -> Result<Option<Organization>>;

    /// Apply a partial update and return the stored result
    ///
    /// Fields absent from `update` keep their stored value even when another
    /// update to the same organization runs concurrently. Errors if `id` does
    /// not exist.
    async fn update_organization(&self, id: i64, update: OrganizationUpdate)
        -> Result<Organization>;

    /// Delete an organization
    ///
    /// Deleting an unknown id is not an error (`existed = false`).
    async fn delete_organization(&self, id: i64) -> Result<DeleteResult>;

    /// All organizations ordered by `name` ascending, then `id`
    async fn list_organizations(&self) -> Result<Vec<Organization>>;

    /// Number of organizations whose `parent_id` is `id`
    async fn count_children(&self, id: i64) -> Result<u64>;

    /// Inclusive closure of `id` in `direction`
    ///
    /// Returns the starting organization plus every organization reachable by
    /// repeatedly following the parent edge (`Upward`) or child edges
    /// (`Downward`). Must be computed in one consistent read and must
    /// terminate even if the parent relation contains a cycle.
    ///
    /// An unknown `id` yields an empty vector. Order is unspecified.
    async fn tree_closure(
        &self,
        id: i64,
        direction: TraversalDirection,
    ) -> Result<Vec<Organization>>;

    /// Release resources (flush WAL, etc.)
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
