//! HTTP course source
//!
//! Talks to the course marketplace REST API (default: the hosted server)

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

use crate::catalog::models::{DiscoveryQuery, EnrollmentRequest};
use crate::catalog::source::{CatalogError, CourseSource};

/// HTTP source configuration
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://altrion-server.vercel.app".to_string(),
            timeout_secs: 30,
        }
    }
}

/// REST-backed course source
pub struct HttpCourseSource {
    base_url: Url,
    client: Client,
}

impl HttpCourseSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            CatalogError::InvalidRequest(format!("Invalid API base URL '{}': {}", config.base_url, e))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidRequest(format!(
                "API base URL '{}' cannot carry paths",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::NetworkFailure(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    pub fn with_default_config() -> Result<Self, CatalogError> {
        Self::new(HttpSourceConfig::default())
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint(&self.base_url, segments)
    }

    async fn get_json(&self, url: Url, what: &str, kind: RequestKind) -> Result<Value, CatalogError> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkFailure(format!("Cannot reach course service: {}", e)))?;

        read_json(response, what, kind).await
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    // Checked in `new`: the base URL can carry path segments
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// What a request asks for; decides how a non-success status reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    /// A single record: 404 means the record does not exist
    Record,
    /// A collection: any non-success status is a fetch failure
    Listing,
    /// A write: 4xx means the service refused it
    Submission,
}

/// Map a non-success status to the error kind callers branch on
fn classify_status(status: StatusCode, body: &str, what: &str, kind: RequestKind) -> CatalogError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        body.trim().chars().take(200).collect()
    };

    if kind == RequestKind::Record && status == StatusCode::NOT_FOUND {
        CatalogError::NotFound(what.to_string())
    } else if kind != RequestKind::Listing && status.is_client_error() {
        CatalogError::Rejected {
            status: status.as_u16(),
            message,
        }
    } else {
        CatalogError::NetworkFailure(format!("{} returned {}: {}", what, status, message))
    }
}

/// Parse a response body as JSON; an empty success body reads as `null`
fn parse_body(body: &str, what: &str) -> Result<Value, CatalogError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| CatalogError::MalformedPayload(format!("{} is not valid JSON: {}", what, e)))
}

async fn read_json(response: reqwest::Response, what: &str, kind: RequestKind) -> Result<Value, CatalogError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CatalogError::NetworkFailure(format!("Failed to read {} response: {}", what, e)))?;

    wire_trace!("{} answered {} with {} bytes", what, status, body.len());

    if !status.is_success() {
        return Err(classify_status(status, &body, what, kind));
    }

    parse_body(&body, what)
}

#[async_trait]
impl CourseSource for HttpCourseSource {
    fn source_name(&self) -> &'static str {
        "http"
    }

    async fn get_courses(&self, query: Option<&DiscoveryQuery>) -> Result<Value, CatalogError> {
        let mut url = self.endpoint(&["courses"]);
        if let Some(query) = query {
            let params = query.to_params();
            if !params.is_empty() {
                url.query_pairs_mut().extend_pairs(params);
            }
        }
        self.get_json(url, "course list", RequestKind::Listing).await
    }

    async fn get_course(&self, id: &str) -> Result<Value, CatalogError> {
        let url = self.endpoint(&["courses", id]);
        self.get_json(url, &format!("course {}", id), RequestKind::Record).await
    }

    async fn get_featured_courses(&self) -> Result<Value, CatalogError> {
        let url = self.endpoint(&["courses", "featured"]);
        self.get_json(url, "featured courses", RequestKind::Listing).await
    }

    async fn get_instructor_courses(&self, email: &str) -> Result<Value, CatalogError> {
        let url = self.endpoint(&["courses", "instructor", email]);
        self.get_json(url, "instructor courses", RequestKind::Listing).await
    }

    async fn get_categories(&self) -> Result<Value, CatalogError> {
        let url = self.endpoint(&["categories"]);
        self.get_json(url, "categories", RequestKind::Listing).await
    }

    async fn get_enrollments(&self, email: &str) -> Result<Value, CatalogError> {
        let url = self.endpoint(&["enrollments", email]);
        self.get_json(url, "enrollments", RequestKind::Listing).await
    }

    async fn create_enrollment(&self, request: &EnrollmentRequest) -> Result<Value, CatalogError> {
        let url = self.endpoint(&["enrollments"]);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkFailure(format!("Cannot reach course service: {}", e)))?;

        read_json(response, "enrollment", RequestKind::Submission).await
    }
}
