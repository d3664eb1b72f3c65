//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `TreeQueryEngine` - Ancestor / descendant closures over the hierarchy
//! - `OrganizationService` - CRUD operations with integrity checks
//!
//! Services receive the store as an injected `Arc<dyn OrganizationStore>` and
//! translate store failures into `OrganizationServiceError`.

pub mod error;
pub mod organization_service;
pub mod tree_query;

pub use error::OrganizationServiceError;
pub use organization_service::OrganizationService;
pub use tree_query::{sort_by_name, TreeQueryEngine};
