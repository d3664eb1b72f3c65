//! HTTP error handling
//!
//! Every failure leaves the API as `{"message", "code", "details"?}` with a
//! status derived from the machine code.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use orgunits_core::OrganizationServiceError;
use serde::{Deserialize, Serialize};

pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const ORGANIZATION_NOT_FOUND: &str = "ORGANIZATION_NOT_FOUND";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const INTEGRITY_VIOLATION: &str = "INTEGRITY_VIOLATION";
pub const QUERY_FAILED: &str = "QUERY_FAILED";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn not_found(id: i64) -> Self {
        Self::new(
            format!("Organization not found: {}", id),
            ORGANIZATION_NOT_FOUND,
        )
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, UNAUTHORIZED)
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            UNAUTHORIZED => StatusCode::UNAUTHORIZED,
            ORGANIZATION_NOT_FOUND => StatusCode::NOT_FOUND,
            VALIDATION_ERROR => StatusCode::BAD_REQUEST,
            INTEGRITY_VIOLATION => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<OrganizationServiceError> for HttpError {
    fn from(err: OrganizationServiceError) -> Self {
        match err {
            OrganizationServiceError::NotFound { id } => HttpError::not_found(id),
            OrganizationServiceError::ValidationFailed(inner) => {
                HttpError::new(inner.to_string(), VALIDATION_ERROR)
            }
            OrganizationServiceError::IntegrityViolation(message) => {
                HttpError::new(message, INTEGRITY_VIOLATION)
            }
            OrganizationServiceError::QueryFailed(message) => {
                HttpError::with_details("Query failed", QUERY_FAILED, message)
            }
            OrganizationServiceError::DatabaseError(inner) => {
                HttpError::with_details("Database operation failed", INTERNAL_ERROR, inner.to_string())
            }
        }
    }
}

/// Malformed, mistyped or incomplete request body
impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::with_details(
            "Invalid request body",
            VALIDATION_ERROR,
            rejection.body_text(),
        )
    }
}

/// Path segment that does not parse (e.g. a non-numeric id)
impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        HttpError::with_details("Invalid path", VALIDATION_ERROR, rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgunits_core::ValidationError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OrganizationServiceError::not_found(3), StatusCode::NOT_FOUND),
            (
                OrganizationServiceError::ValidationFailed(ValidationError::MissingField(
                    "name".into(),
                )),
                StatusCode::BAD_REQUEST,
            ),
            (
                OrganizationServiceError::integrity_violation("dup"),
                StatusCode::CONFLICT,
            ),
            (
                OrganizationServiceError::query_failed("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(HttpError::from(err).status(), expected);
        }
        assert_eq!(
            HttpError::unauthorized("no").status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_details_omitted_when_absent() {
        let body = serde_json::to_value(HttpError::not_found(8)).unwrap();
        assert_eq!(body["code"], ORGANIZATION_NOT_FOUND);
        assert!(body.get("details").is_none());
    }
}
