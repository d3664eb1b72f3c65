//! Data Models
//!
//! This module contains the data structures shared by the store, the services
//! and the HTTP layer:
//!
//! - `Organization` - A stored organizational unit
//! - `NewOrganization` / `OrganizationUpdate` - Create and PATCH inputs
//! - `TraversalDirection` - Upward (ancestors) or downward (descendants)

mod organization;

pub use organization::{
    DeleteResult, NewOrganization, Organization, OrganizationUpdate, TraversalDirection,
    ValidationError, MAX_FIELD_LENGTH,
};
