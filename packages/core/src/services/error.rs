//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations, providing
//! detailed error handling for business logic failures.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum OrganizationServiceError {
    /// Organization not found by id
    #[error("Organization not found: {id}")]
    NotFound { id: i64 },

    /// Input failed validation
    #[error("Organization validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Duplicate code, dangling parent, or delete of a referenced parent
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// Query execution error
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl OrganizationServiceError {
    /// Create a not found error
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// Create an integrity violation error
    pub fn integrity_violation(msg: impl Into<String>) -> Self {
        Self::IntegrityViolation(msg.into())
    }

    /// Create a query failed error
    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::QueryFailed(msg.into())
    }

    /// Translate a store error, keeping constraint failures distinguishable
    ///
    /// Stores report integrity failures as `DatabaseError::ConstraintViolation`
    /// somewhere in the anyhow chain.
    pub fn from_store(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DatabaseError>() {
            Some(DatabaseError::ConstraintViolation { context }) => {
                Self::IntegrityViolation(context.clone())
            }
            _ => Self::QueryFailed(format!("{:#}", err)),
        }
    }
}
