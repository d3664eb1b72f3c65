//! Organization Data Structures
//!
//! This module defines the `Organization` record and the input shapes used to
//! create and modify it.
//!
//! # Hierarchy
//!
//! - Each organization has at most one parent (`parent_id`)
//! - `parent_id = None` marks a root of the forest
//! - Cycles are not rejected here; traversal code must tolerate them
//!
//! # Examples
//!
//! ```rust
//! use orgunits_core::models::{NewOrganization, OrganizationUpdate};
//!
//! let root = NewOrganization::new("Head Office", "HQ");
//! let division = NewOrganization::new("Sales", "SALES").with_parent(1);
//!
//! // Move a node to the top level
//! let update = OrganizationUpdate::new().with_parent_id(None);
//! assert_eq!(update.parent_id, Some(None));
//! # let _ = (root, division);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Upper bound on `name` and `code` length (characters)
pub const MAX_FIELD_LENGTH: usize = 1000;

/// Validation errors for organization input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{field}' exceeds {max} characters")]
    FieldTooLong { field: String, max: usize },
}

/// A single organizational unit in the hierarchy.
///
/// # Fields
///
/// - `id`: Store-assigned identifier, immutable after creation
/// - `name`: Human-readable label (not unique)
/// - `code`: Globally unique business code
/// - `parent_id`: Optional parent reference (`None` means root)
/// - `created_at` / `modified_at`: Store-maintained timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Organization {
    /// Whether this organization sits at the top of its tree
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input for creating an organization (also used for full replacement)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl NewOrganization {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            parent_id: None,
        }
    }

    /// Place the new organization under `parent_id`
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Check required fields and length limits
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("name", &self.name)?;
        validate_text("code", &self.code)?;
        Ok(())
    }
}

/// Deserialize helper for double-Option fields.
///
/// A present `null` becomes `Some(None)`; a missing field stays `None`
/// through `#[serde(default)]`.
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial update structure for PATCH operations
///
/// Only provided fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Update parent reference
    ///
    /// Uses double-Option pattern:
    /// - `None`: Don't change parent_id
    /// - `Some(None)`: Detach (this organization becomes a root)
    /// - `Some(Some(id))`: Re-parent under the specified organization
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<i64>>,
}

impl OrganizationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_parent_id(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.code.is_none() && self.parent_id.is_none()
    }

    /// Validate only the fields being changed
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_text("name", name)?;
        }
        if let Some(code) = &self.code {
            validate_text("code", code)?;
        }
        Ok(())
    }

    /// Apply this update on top of `current`, yielding the full replacement values
    pub fn apply_to(&self, current: &Organization) -> NewOrganization {
        NewOrganization {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            code: self.code.clone().unwrap_or_else(|| current.code.clone()),
            parent_id: match self.parent_id {
                None => current.parent_id,
                Some(new_parent) => new_parent,
            },
        }
    }
}

impl From<NewOrganization> for OrganizationUpdate {
    fn from(value: NewOrganization) -> Self {
        Self {
            name: Some(value.name),
            code: Some(value.code),
            parent_id: Some(value.parent_id),
        }
    }
}

fn validate_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    if value.chars().count() > MAX_FIELD_LENGTH {
        return Err(ValidationError::FieldTooLong {
            field: field.to_string(),
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}

/// Outcome of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// Whether a row was actually removed
    pub existed: bool,
}

/// Direction of a hierarchy traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalDirection {
    /// Follow `parent_id` towards the root (ancestors)
    Upward,
    /// Follow child edges towards the leaves (descendants)
    Downward,
}
