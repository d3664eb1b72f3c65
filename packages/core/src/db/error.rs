//! Database Error Types
//!
//! This module defines error types for database operations, providing
//! clear error handling for connection, initialization, constraint and
//! query failures.

use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
///
/// Constraint failures get their own variant so the service layer can
/// report them as integrity violations instead of generic query errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// UNIQUE / FOREIGN KEY / NOT NULL constraint rejected a write
    #[error("Constraint violation: {context}")]
    ConstraintViolation { context: String },

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a constraint violation error
    pub fn constraint_violation(context: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            context: context.into(),
        }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Classify a libsql failure raised while running `operation`.
    ///
    /// SQLite reports constraint failures as "<KIND> constraint failed: ...".
    pub fn from_write(operation: &str, err: libsql::Error) -> Self {
        let message = err.to_string();
        if message.contains("constraint failed") {
            Self::constraint_violation(format!("{}: {}", operation, message))
        } else {
            Self::sql_execution(format!("{}: {}", operation, message))
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }
}
