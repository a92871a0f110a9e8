//! Course source trait and error types
//!
//! Defines the transport seam between the repository client and the REST API.
//! Sources return raw JSON; shaping it into courses is the repository's job so
//! that every transport gets the same tolerance for odd payloads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::models::{DiscoveryQuery, EnrollmentRequest};

/// Error types for catalog operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CatalogError {
    /// Transport failure, timeout, or unexpected non-2xx status
    #[error("Network failure: {0}")]
    NetworkFailure(String),
    /// The requested record does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),
    /// The response body was not the expected shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    /// The service refused the request (4xx other than 404)
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The current user may not perform this action
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CatalogError {
    /// Failures a retry might fix, as opposed to "go back" conditions
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::NetworkFailure(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

/// The interface every course backend implements
#[async_trait]
pub trait CourseSource: Send + Sync {
    /// Short name for logs (e.g. "http")
    fn source_name(&self) -> &'static str;

    /// `GET /courses`, optionally with server-side filter parameters
    async fn get_courses(&self, query: Option<&DiscoveryQuery>) -> Result<Value, CatalogError>;

    /// `GET /courses/{id}`
    async fn get_course(&self, id: &str) -> Result<Value, CatalogError>;

    /// `GET /courses/featured`
    async fn get_featured_courses(&self) -> Result<Value, CatalogError>;

    /// `GET /courses/instructor/{email}`
    async fn get_instructor_courses(&self, email: &str) -> Result<Value, CatalogError>;

    /// `GET /categories`
    async fn get_categories(&self) -> Result<Value, CatalogError>;

    /// `GET /enrollments/{email}`
    async fn get_enrollments(&self, email: &str) -> Result<Value, CatalogError>;

    /// `POST /enrollments`
    async fn create_enrollment(&self, request: &EnrollmentRequest) -> Result<Value, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let missing = CatalogError::NotFound("course missing-id".into());
        let offline = CatalogError::NetworkFailure("connection refused".into());

        assert!(missing.is_not_found());
        assert!(!missing.is_retryable());
        assert!(offline.is_retryable());
        assert!(!offline.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = CatalogError::Rejected {
            status: 400,
            message: "already enrolled".into(),
        };
        assert_eq!(err.to_string(), "Request rejected (400): already enrolled");
    }
}
