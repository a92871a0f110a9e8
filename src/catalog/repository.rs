//! Course repository client
//!
//! Wraps a `CourseSource` and turns whatever the service answers into plain,
//! well-shaped data. Owns every fallback: malformed lists become empty lists,
//! a failed server-side filter becomes a local filter over the full list, a
//! failed category fetch becomes the fallback vocabulary, and an unreachable
//! service falls back to the last cached snapshot when one exists.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::access::User;
use crate::catalog::filter::{featured_courses, filter_courses};
use crate::catalog::models::{
    CategoryVocabulary, Course, DiscoveryQuery, EnrollOutcome, Enrollment, EnrollmentRequest,
};
use crate::catalog::source::{CatalogError, CourseSource};
use crate::database::DatabaseManager;

/// Where a course listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOrigin {
    /// Answered by the service for this exact request
    Server,
    /// Full list fetched from the service, filtered locally
    LocalFilter,
    /// Read from the offline snapshot
    Snapshot,
}

/// A course list plus its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct CourseListing {
    pub courses: Vec<Course>,
    pub origin: ListingOrigin,
}

/// The repository client used by the discovery pipeline
pub struct CourseRepository {
    source: Arc<dyn CourseSource>,
    cache: Option<Arc<DatabaseManager>>,
}

impl CourseRepository {
    pub fn new(source: Arc<dyn CourseSource>) -> Self {
        Self { source, cache: None }
    }

    /// Attach an offline snapshot cache
    pub fn with_cache(mut self, cache: Arc<DatabaseManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn source_name(&self) -> &'static str {
        self.source.source_name()
    }

    /// Full course collection from the service.
    ///
    /// A payload that is not a list yields an empty list, never an error.
    /// Transport failures are returned to the caller.
    pub async fn fetch_all_courses(&self) -> Result<Vec<Course>, CatalogError> {
        let result = timed_request!("Course list", self.source.get_courses(None).await);

        match result {
            Ok(payload) => match course_list(payload, "course list") {
                Some(courses) => {
                    self.store_snapshot(&courses);
                    Ok(courses)
                }
                None => Ok(Vec::new()),
            },
            Err(CatalogError::MalformedPayload(msg)) => {
                log::warn!("Course list payload unreadable, treating as empty: {}", msg);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Full collection from the service, or the last snapshot when unreachable
    pub async fn fetch_all_courses_or_cached(&self) -> Result<CourseListing, CatalogError> {
        match self.fetch_all_courses().await {
            Ok(courses) => Ok(CourseListing {
                courses,
                origin: ListingOrigin::Server,
            }),
            Err(e) => match self.cached_courses() {
                Some(courses) => {
                    log::warn!("Course service unavailable ({}), using cached snapshot", e);
                    Ok(CourseListing {
                        courses,
                        origin: ListingOrigin::Snapshot,
                    })
                }
                None => Err(e),
            },
        }
    }

    /// Single course by id; a missing course is `NotFound`, never `NetworkFailure`
    pub async fn fetch_course_by_id(&self, id: &str) -> Result<Course, CatalogError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CatalogError::NotFound("course with empty id".to_string()));
        }

        let payload = self.source.get_course(id).await.map_err(|e| match e {
            CatalogError::NotFound(_) => CatalogError::NotFound(format!("course {}", id)),
            other => other,
        })?;

        match &payload {
            // The store answers a missing document with an empty 200
            Value::Null => return Err(CatalogError::NotFound(format!("course {}", id))),
            Value::Object(map) if map.is_empty() => {
                return Err(CatalogError::NotFound(format!("course {}", id)))
            }
            Value::Object(_) => {}
            other => {
                return Err(CatalogError::MalformedPayload(format!(
                    "course {} is a {} rather than an object",
                    id,
                    json_kind(other)
                )))
            }
        }

        serde_json::from_value(payload).map_err(|e| {
            CatalogError::MalformedPayload(format!("course {} could not be decoded: {}", id, e))
        })
    }

    /// Server-side filtered list.
    ///
    /// Any failure of the filtered request falls back to the full collection
    /// filtered locally, so both paths yield the same ordered result.
    pub async fn fetch_filtered_courses(
        &self,
        query: &DiscoveryQuery,
    ) -> Result<Vec<Course>, CatalogError> {
        self.fetch_filtered_listing(query).await.map(|listing| listing.courses)
    }

    /// `fetch_filtered_courses` plus where the answer came from
    pub async fn fetch_filtered_listing(
        &self,
        query: &DiscoveryQuery,
    ) -> Result<CourseListing, CatalogError> {
        if query.is_unconstrained() {
            return self.fetch_all_courses_or_cached().await;
        }

        let result = timed_request!("Filtered course", self.source.get_courses(Some(query)).await);

        let failure = match result {
            Ok(payload) => match course_list(payload, "filtered course list") {
                // The service may ignore or loosely apply the parameters;
                // the local pass keeps the result identical to the client path
                Some(courses) => {
                    return Ok(CourseListing {
                        courses: filter_courses(&courses, query),
                        origin: ListingOrigin::Server,
                    })
                }
                None => "payload was not a list".to_string(),
            },
            Err(e) => e.to_string(),
        };

        log::warn!("Server-side filtering failed ({}), filtering locally", failure);

        let all = self.fetch_all_courses_or_cached().await?;
        let origin = match all.origin {
            ListingOrigin::Snapshot => ListingOrigin::Snapshot,
            _ => ListingOrigin::LocalFilter,
        };

        Ok(CourseListing {
            courses: filter_courses(&all.courses, query),
            origin,
        })
    }

    /// Category vocabulary; never fails, falls back to a fixed list
    pub async fn fetch_categories(&self) -> CategoryVocabulary {
        match self.source.get_categories().await {
            Ok(payload) => match category_names(&payload).map(CategoryVocabulary::from_names) {
                Some(vocabulary) if !vocabulary.is_empty() => vocabulary,
                _ => {
                    log::warn!("Category payload empty or unreadable, using fallback categories");
                    CategoryVocabulary::fallback()
                }
            },
            Err(e) => {
                log::warn!("Failed to fetch categories ({}), using fallback categories", e);
                CategoryVocabulary::fallback()
            }
        }
    }

    /// Featured courses; falls back to filtering the full list when the
    /// featured endpoint is missing or failing
    pub async fn fetch_featured_courses(&self) -> Result<Vec<Course>, CatalogError> {
        match self.source.get_featured_courses().await {
            Ok(payload) => {
                if let Some(courses) = course_list(payload, "featured courses") {
                    return Ok(courses);
                }
                log::warn!("Featured payload was not a list, filtering full list");
            }
            Err(e) => log::warn!("Featured endpoint unavailable ({}), filtering full list", e),
        }

        let all = self.fetch_all_courses_or_cached().await?;
        Ok(featured_courses(&all.courses))
    }

    /// Courses for the home page: the featured ones, or the first
    /// `fallback_limit` courses of the full list when nothing is featured
    pub async fn fetch_popular_courses(&self, fallback_limit: usize) -> Result<Vec<Course>, CatalogError> {
        let featured = self.fetch_featured_courses().await?;
        if !featured.is_empty() {
            return Ok(featured);
        }

        log::info!("No featured courses, showing the first {} courses", fallback_limit);
        let mut all = self.fetch_all_courses_or_cached().await?.courses;
        all.truncate(fallback_limit);
        Ok(all)
    }

    /// Courses created by one instructor
    pub async fn fetch_instructor_courses(&self, email: &str) -> Result<Vec<Course>, CatalogError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CatalogError::InvalidRequest("instructor email is required".to_string()));
        }

        match self.source.get_instructor_courses(email).await {
            Ok(payload) => Ok(course_list(payload, "instructor courses").unwrap_or_default()),
            Err(CatalogError::MalformedPayload(msg)) => {
                log::warn!("Instructor course payload unreadable, treating as empty: {}", msg);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Enrollments of one user
    pub async fn fetch_enrollments(&self, email: &str) -> Result<Vec<Enrollment>, CatalogError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CatalogError::InvalidRequest("user email is required".to_string()));
        }

        match self.source.get_enrollments(email).await {
            Ok(payload) => Ok(decode_list(payload, "enrollments").unwrap_or_default()),
            Err(CatalogError::MalformedPayload(msg)) => {
                log::warn!("Enrollment payload unreadable, treating as empty: {}", msg);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Enroll the signed-in user in a course
    pub async fn enroll(&self, user: Option<&User>, course: &Course) -> Result<EnrollOutcome, CatalogError> {
        let Some(user) = user.filter(|u| !u.email.trim().is_empty()) else {
            return Err(CatalogError::Unauthorized("please sign in to enroll".to_string()));
        };

        let request = EnrollmentRequest {
            course_id: course.id.clone(),
            user_email: user.email.trim().to_string(),
            user_name: user.display_name.clone(),
            course_title: course.title.clone(),
        };

        match self.source.create_enrollment(&request).await {
            Ok(_) => {
                log::info!("Enrolled {} in course {}", request.user_email, request.course_id);
                Ok(EnrollOutcome::Enrolled)
            }
            Err(CatalogError::Rejected { status: 400, .. }) => Ok(EnrollOutcome::AlreadyEnrolled),
            Err(e) => Err(e),
        }
    }

    /// Last cached course list, if a cache is attached and populated
    pub fn cached_courses(&self) -> Option<Vec<Course>> {
        let cache = self.cache.as_ref()?;
        match cache.load_course_snapshot() {
            Ok(snapshot) => snapshot.map(|s| {
                log::debug!("Loaded {} cached courses from {}", s.courses.len(), s.fetched_at);
                s.courses
            }),
            Err(e) => {
                log::warn!("Failed to read course snapshot: {}", e);
                None
            }
        }
    }

    fn store_snapshot(&self, courses: &[Course]) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_course_snapshot(courses) {
                log::warn!("Failed to cache course list: {}", e);
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Pull the list out of a payload: a bare array, or an envelope carrying one
/// under `courses`/`data`. `None` when there is no list at all.
fn list_items(payload: Value, what: &str) -> Option<Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            let items = ["courses", "data"]
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                });
            if items.is_none() {
                log::warn!("{} payload is an object without a list", what);
            }
            items
        }
        other => {
            log::warn!("{} payload is a {} rather than a list", what, json_kind(&other));
            None
        }
    }
}

/// Decode each element, skipping (and logging) the ones that do not fit
fn decode_list<T: serde::de::DeserializeOwned>(payload: Value, what: &str) -> Option<Vec<T>> {
    let items = list_items(payload, what)?;
    let total = items.len();

    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Skipping {} entry #{}: {}", what, index, e);
                None
            }
        })
        .collect();

    if decoded.len() < total {
        log::warn!("Decoded {} of {} {} entries", decoded.len(), total, what);
    }

    Some(decoded)
}

fn course_list(payload: Value, what: &str) -> Option<Vec<Course>> {
    decode_list(payload, what)
}

/// Category names from a list of strings or `{ "name": .. }` objects
fn category_names(payload: &Value) -> Option<Vec<String>> {
    let items = payload.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name.clone()),
                Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect(),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::models::ALL_CATEGORIES;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// In-memory source with scripted answers per endpoint
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub courses: Mutex<Option<Result<Value, CatalogError>>>,
        pub filtered: Mutex<Option<Result<Value, CatalogError>>>,
        pub course: Mutex<Option<Result<Value, CatalogError>>>,
        pub featured: Mutex<Option<Result<Value, CatalogError>>>,
        pub categories: Mutex<Option<Result<Value, CatalogError>>>,
        pub enrollment: Mutex<Option<Result<Value, CatalogError>>>,
        pub requests: Mutex<Vec<String>>,
    }

    fn offline() -> CatalogError {
        CatalogError::NetworkFailure("connection refused".into())
    }

    fn answer(slot: &Mutex<Option<Result<Value, CatalogError>>>) -> Result<Value, CatalogError> {
        slot.lock().unwrap().clone().unwrap_or_else(|| Err(offline()))
    }

    impl FakeSource {
        pub fn with_courses(payload: Value) -> Self {
            let source = Self::default();
            *source.courses.lock().unwrap() = Some(Ok(payload));
            source
        }

        pub fn set(slot: &Mutex<Option<Result<Value, CatalogError>>>, value: Result<Value, CatalogError>) {
            *slot.lock().unwrap() = Some(value);
        }

        fn record(&self, request: String) {
            self.requests.lock().unwrap().push(request);
        }
    }

    #[async_trait]
    impl CourseSource for FakeSource {
        fn source_name(&self) -> &'static str {
            "fake"
        }

        async fn get_courses(&self, query: Option<&DiscoveryQuery>) -> Result<Value, CatalogError> {
            match query {
                Some(q) => {
                    self.record(format!("courses?{:?}", q.to_params()));
                    answer(&self.filtered)
                }
                None => {
                    self.record("courses".into());
                    answer(&self.courses)
                }
            }
        }

        async fn get_course(&self, id: &str) -> Result<Value, CatalogError> {
            self.record(format!("courses/{}", id));
            answer(&self.course)
        }

        async fn get_featured_courses(&self) -> Result<Value, CatalogError> {
            self.record("courses/featured".into());
            answer(&self.featured)
        }

        async fn get_instructor_courses(&self, email: &str) -> Result<Value, CatalogError> {
            self.record(format!("courses/instructor/{}", email));
            answer(&self.courses)
        }

        async fn get_categories(&self) -> Result<Value, CatalogError> {
            self.record("categories".into());
            answer(&self.categories)
        }

        async fn get_enrollments(&self, email: &str) -> Result<Value, CatalogError> {
            self.record(format!("enrollments/{}", email));
            answer(&self.enrollment)
        }

        async fn create_enrollment(&self, request: &EnrollmentRequest) -> Result<Value, CatalogError> {
            self.record(format!("POST enrollments {}", request.course_id));
            answer(&self.enrollment)
        }
    }

    pub(crate) fn sample_payload() -> Value {
        json!([
            { "_id": "1", "title": "Intro to Web Dev", "category": "Web Development", "isFeatured": true },
            { "_id": "2", "title": "Data Science 101", "category": "Data Science" },
            { "_id": "3", "title": "Advanced Web Dev", "category": "Web Development", "isFeatured": true }
        ])
    }

    fn make_repo(source: FakeSource) -> (Arc<FakeSource>, CourseRepository) {
        let source = Arc::new(source);
        (source.clone(), CourseRepository::new(source))
    }

    fn titles(courses: &[Course]) -> Vec<&str> {
        courses.iter().map(|c| c.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fetch_all_coerces_non_list_to_empty() {
        let (_, repo) = make_repo(FakeSource::with_courses(json!({ "message": "ok" })));
        assert!(repo.fetch_all_courses().await.unwrap().is_empty());

        let (_, repo) = make_repo(FakeSource::with_courses(json!("surprise")));
        assert!(repo.fetch_all_courses().await.unwrap().is_empty());

        let source = FakeSource::default();
        FakeSource::set(&source.courses, Err(CatalogError::MalformedPayload("html".into())));
        let (_, repo) = make_repo(source);
        assert!(repo.fetch_all_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_accepts_envelopes_and_skips_bad_entries() {
        let (_, repo) = make_repo(FakeSource::with_courses(json!({
            "data": [{ "_id": "1", "title": "Kept" }, { "title": "No id" }, 42]
        })));
        let courses = repo.fetch_all_courses().await.unwrap();
        assert_eq!(titles(&courses), vec!["Kept"]);
    }

    #[tokio::test]
    async fn test_fetch_all_reports_network_failure() {
        let (_, repo) = make_repo(FakeSource::default());
        assert!(matches!(repo.fetch_all_courses().await, Err(CatalogError::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn test_fetch_course_by_id_not_found_is_distinct() {
        let source = FakeSource::default();
        FakeSource::set(&source.course, Err(CatalogError::NotFound("course".into())));
        let (_, repo) = make_repo(source);
        let err = repo.fetch_course_by_id("missing-id").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_retryable());

        let source = FakeSource::default();
        FakeSource::set(&source.course, Ok(Value::Null));
        let (_, repo) = make_repo(source);
        assert!(repo.fetch_course_by_id("missing-id").await.unwrap_err().is_not_found());

        let (_, repo) = make_repo(FakeSource::default());
        let err = repo.fetch_course_by_id("any").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_course_by_id_decodes_record() {
        let source = FakeSource::default();
        FakeSource::set(&source.course, Ok(json!({ "_id": "42", "title": "Rust", "price": 10 })));
        let (source, repo) = make_repo(source);

        let course = repo.fetch_course_by_id(" 42 ").await.unwrap();
        assert_eq!(course.title, "Rust");
        assert_eq!(course.price, Some(10.0));
        assert_eq!(source.requests.lock().unwrap().as_slice(), ["courses/42"]);
    }

    #[tokio::test]
    async fn test_fetch_course_by_id_malformed() {
        let source = FakeSource::default();
        FakeSource::set(&source.course, Ok(json!([1, 2, 3])));
        let (_, repo) = make_repo(source);
        assert!(matches!(
            repo.fetch_course_by_id("1").await,
            Err(CatalogError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_server_and_client_filtering_are_equivalent() {
        let full: Vec<Course> = serde_json::from_value(sample_payload()).unwrap();
        let queries = [
            DiscoveryQuery::new("Web Development", "intro"),
            DiscoveryQuery::new(ALL_CATEGORIES, "dev"),
            DiscoveryQuery::new("Data Science", ""),
            DiscoveryQuery::new(ALL_CATEGORIES, "   "),
            DiscoveryQuery::new("Nope", "x"),
        ];

        for query in queries {
            // Filtered request fails, full list succeeds
            let (_, repo) = make_repo(FakeSource::with_courses(sample_payload()));
            let fallback = repo.fetch_filtered_courses(&query).await.unwrap();
            assert_eq!(fallback, filter_courses(&full, &query), "query {:?}", query);

            // Filtered request "succeeds" but the service ignored the parameters
            let source = FakeSource::with_courses(sample_payload());
            FakeSource::set(&source.filtered, Ok(sample_payload()));
            let (_, repo) = make_repo(source);
            let server = repo.fetch_filtered_courses(&query).await.unwrap();
            assert_eq!(server, fallback, "query {:?}", query);
        }
    }

    #[tokio::test]
    async fn test_filtered_sends_parameters() {
        let source = FakeSource::with_courses(sample_payload());
        FakeSource::set(&source.filtered, Ok(json!([])));
        let (source, repo) = make_repo(source);

        let listing = repo
            .fetch_filtered_listing(&DiscoveryQuery::new("Data Science", " py "))
            .await
            .unwrap();
        assert_eq!(listing.origin, ListingOrigin::Server);

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("Data Science"));
        assert!(requests[0].contains("\"py\""));
    }

    #[tokio::test]
    async fn test_filtered_fallback_origin() {
        let (_, repo) = make_repo(FakeSource::with_courses(sample_payload()));
        let listing = repo
            .fetch_filtered_listing(&DiscoveryQuery::new("Data Science", ""))
            .await
            .unwrap();
        assert_eq!(listing.origin, ListingOrigin::LocalFilter);
        assert_eq!(titles(&listing.courses), vec!["Data Science 101"]);
    }

    #[tokio::test]
    async fn test_filtered_fails_when_nothing_is_reachable() {
        let (_, repo) = make_repo(FakeSource::default());
        let result = repo.fetch_filtered_courses(&DiscoveryQuery::new("Data Science", "")).await;
        assert!(matches!(result, Err(CatalogError::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn test_snapshot_fallback() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(DatabaseManager::new(dir.path().join("cache.db")).unwrap());

        // Online: the list is cached
        let source = Arc::new(FakeSource::with_courses(sample_payload()));
        let online = CourseRepository::new(source.clone()).with_cache(cache.clone());
        assert_eq!(online.fetch_all_courses().await.unwrap().len(), 3);

        // Offline: the cached list backs both the full and filtered paths
        let offline = CourseRepository::new(Arc::new(FakeSource::default())).with_cache(cache);
        let listing = offline.fetch_all_courses_or_cached().await.unwrap();
        assert_eq!(listing.origin, ListingOrigin::Snapshot);
        assert_eq!(listing.courses.len(), 3);

        let filtered = offline
            .fetch_filtered_listing(&DiscoveryQuery::new(ALL_CATEGORIES, "advanced"))
            .await
            .unwrap();
        assert_eq!(filtered.origin, ListingOrigin::Snapshot);
        assert_eq!(titles(&filtered.courses), vec!["Advanced Web Dev"]);

        // The typed failure is still reported by the plain operation
        assert!(offline.fetch_all_courses().await.is_err());
    }

    #[tokio::test]
    async fn test_categories_fallback() {
        let (_, repo) = make_repo(FakeSource::default());
        let vocab = repo.fetch_categories().await;
        assert!(vocab.is_fallback);
        assert_eq!(vocab.options()[0], ALL_CATEGORIES);

        let source = FakeSource::default();
        FakeSource::set(&source.categories, Ok(json!({ "error": true })));
        let (_, repo) = make_repo(source);
        assert!(repo.fetch_categories().await.is_fallback);

        let source = FakeSource::default();
        FakeSource::set(&source.categories, Ok(json!(["", "  ", "All"])));
        let (_, repo) = make_repo(source);
        let vocab = repo.fetch_categories().await;
        assert!(vocab.is_fallback);
        assert!(!vocab.is_empty());
    }

    #[tokio::test]
    async fn test_categories_from_strings_or_objects() {
        let source = FakeSource::default();
        FakeSource::set(
            &source.categories,
            Ok(json!(["Business", { "name": "Photography" }, 7, "Business"])),
        );
        let (_, repo) = make_repo(source);

        let vocab = repo.fetch_categories().await;
        assert!(!vocab.is_fallback);
        assert_eq!(vocab.options(), vec!["All", "Business", "Photography"]);
    }

    #[tokio::test]
    async fn test_featured_falls_back_to_local_filter() {
        let (source, repo) = make_repo(FakeSource::with_courses(sample_payload()));
        let featured = repo.fetch_featured_courses().await.unwrap();

        assert_eq!(titles(&featured), vec!["Intro to Web Dev", "Advanced Web Dev"]);
        assert_eq!(
            source.requests.lock().unwrap().as_slice(),
            ["courses/featured", "courses"]
        );
    }

    #[tokio::test]
    async fn test_featured_endpoint_used_when_present() {
        let source = FakeSource::default();
        FakeSource::set(&source.featured, Ok(json!([{ "_id": "9", "title": "Picked" }])));
        let (_, repo) = make_repo(source);

        assert_eq!(titles(&repo.fetch_featured_courses().await.unwrap()), vec!["Picked"]);
    }

    #[tokio::test]
    async fn test_popular_courses_fall_back_to_first_courses() {
        let source = FakeSource::with_courses(sample_payload());
        FakeSource::set(&source.featured, Ok(json!([])));
        let (_, repo) = make_repo(source);

        assert!(repo.fetch_featured_courses().await.unwrap().is_empty());
        let popular = repo.fetch_popular_courses(2).await.unwrap();
        assert_eq!(titles(&popular), vec!["Intro to Web Dev", "Data Science 101"]);
    }

    #[tokio::test]
    async fn test_popular_courses_prefer_featured() {
        let source = FakeSource::with_courses(sample_payload());
        FakeSource::set(&source.featured, Ok(json!([{ "_id": "9", "title": "Picked" }])));
        let (_, repo) = make_repo(source);

        assert_eq!(titles(&repo.fetch_popular_courses(6).await.unwrap()), vec!["Picked"]);
    }

    #[tokio::test]
    async fn test_enroll_requires_user() {
        let (source, repo) = make_repo(FakeSource::default());
        let course = Course::new("1", "Rust");

        let result = repo.enroll(None, &course).await;
        assert!(matches!(result, Err(CatalogError::Unauthorized(_))));
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enroll_outcomes() {
        let course = Course::new("1", "Rust");
        let user = User::new("learner@example.com");

        let source = FakeSource::default();
        FakeSource::set(&source.enrollment, Ok(json!({ "insertedId": "e1" })));
        let (_, repo) = make_repo(source);
        assert_eq!(repo.enroll(Some(&user), &course).await.unwrap(), EnrollOutcome::Enrolled);

        let source = FakeSource::default();
        FakeSource::set(
            &source.enrollment,
            Err(CatalogError::Rejected { status: 400, message: "exists".into() }),
        );
        let (_, repo) = make_repo(source);
        assert_eq!(
            repo.enroll(Some(&user), &course).await.unwrap(),
            EnrollOutcome::AlreadyEnrolled
        );
    }

    #[tokio::test]
    async fn test_fetch_enrollments() {
        let source = FakeSource::default();
        FakeSource::set(
            &source.enrollment,
            Ok(json!([
                { "_id": "e1", "courseId": "1", "userEmail": "a@b.com", "courseTitle": "Rust" },
                { "broken": true }
            ])),
        );
        let (_, repo) = make_repo(source);

        let enrollments = repo.fetch_enrollments("a@b.com").await.unwrap();
        assert_eq!(enrollments.len(), 1);
        assert_eq!(enrollments[0].course_title.as_deref(), Some("Rust"));

        assert!(matches!(
            repo.fetch_enrollments(" ").await,
            Err(CatalogError::InvalidRequest(_))
        ));
    }
}
