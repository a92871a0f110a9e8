// Course detail lookup
// Resolves a selected course id to its full record, independent of the list query

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::models::Course;
use crate::catalog::repository::CourseRepository;
use crate::catalog::source::CatalogError;

/// What the detail page should render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetailView {
    Loaded { course: Course },
    /// The id resolves to nothing; the remedy is to go back
    NotFound { id: String },
    /// Transport or payload failure; the remedy is to retry
    Unavailable { id: String, message: String },
}

impl DetailView {
    fn from_result(id: &str, result: Result<Course, CatalogError>) -> Self {
        match result {
            Ok(course) => DetailView::Loaded { course },
            Err(e) if e.is_not_found() => DetailView::NotFound { id: id.to_string() },
            Err(e) => DetailView::Unavailable {
                id: id.to_string(),
                message: e.to_string(),
            },
        }
    }

    pub fn course(&self) -> Option<&Course> {
        match self {
            DetailView::Loaded { course } => Some(course),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DetailView::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DetailView::Unavailable { .. })
    }
}

pub struct DetailLookup {
    repo: Arc<CourseRepository>,
    selection: AtomicU64,
    current: RwLock<Option<DetailView>>,
}

impl DetailLookup {
    pub fn new(repo: Arc<CourseRepository>) -> Self {
        Self {
            repo,
            selection: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    /// Resolve `id` and make it the current detail view.
    ///
    /// The returned view always describes `id`. It only becomes `current()`
    /// if no later selection was made while the lookup was in flight.
    pub async fn open(&self, id: &str) -> DetailView {
        let selection = self.selection.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.repo.fetch_course_by_id(id).await;
        if let Err(e) = &result {
            if e.is_not_found() {
                log::info!("Course {} not found", id);
            } else {
                log::warn!("Failed to load course {}: {}", id, e);
            }
        }
        let view = DetailView::from_result(id, result);

        let mut current = self.current.write().await;
        if self.selection.load(Ordering::SeqCst) == selection {
            *current = Some(view.clone());
        } else {
            log::debug!("Detail lookup for {} superseded by a newer selection", id);
        }

        view
    }

    pub async fn current(&self) -> Option<DetailView> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::tests::FakeSource;
    use serde_json::json;

    fn lookup(source: FakeSource) -> DetailLookup {
        DetailLookup::new(Arc::new(CourseRepository::new(Arc::new(source))))
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let source = FakeSource::default();
        FakeSource::set(&source.course, Err(CatalogError::NotFound("404".into())));
        let lookup = lookup(source);

        let view = lookup.open("missing-id").await;
        assert_eq!(view, DetailView::NotFound { id: "missing-id".into() });
        assert!(view.is_not_found());
        assert!(!view.is_retryable());
        assert_eq!(lookup.current().await, Some(view));
    }

    #[tokio::test]
    async fn test_network_failure_is_retryable() {
        let lookup = lookup(FakeSource::default());

        let view = lookup.open("1").await;
        assert!(view.is_retryable());
        assert!(!view.is_not_found());
    }

    #[tokio::test]
    async fn test_loaded_course() {
        let source = FakeSource::default();
        FakeSource::set(&source.course, Ok(json!({ "_id": "7", "title": "Rust Basics" })));
        let lookup = lookup(source);

        let view = lookup.open("7").await;
        assert_eq!(view.course().map(|c| c.title.as_str()), Some("Rust Basics"));
    }

    #[tokio::test]
    async fn test_empty_record_is_not_found() {
        let source = FakeSource::default();
        FakeSource::set(&source.course, Ok(json!({})));
        assert!(lookup(source).open("7").await.is_not_found());
    }

    #[test]
    fn test_view_serializes_with_status_tag() {
        let value = serde_json::to_value(DetailView::NotFound { id: "x".into() }).unwrap();
        assert_eq!(value, json!({ "status": "not_found", "id": "x" }));
    }
}
