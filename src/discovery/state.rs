//! Discovery view state
//!
//! Holds the current query, the visible result set, and the loading flag.
//! Every edit starts a new generation; a fetch only lands if its generation
//! is still current when it resolves, so a slow answer to an old query can
//! never overwrite the answer to a newer one.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::catalog::filter::filter_courses;
use crate::catalog::models::{Course, DiscoveryQuery};
use crate::catalog::repository::{CourseRepository, ListingOrigin};
use crate::catalog::source::CatalogError;

/// How edits are turned into a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Ask the service to filter (with local fallback)
    #[default]
    Server,
    /// Filter a cached full collection locally
    Client,
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            _ => Err(format!("invalid filter mode: {}", s)),
        }
    }
}

/// What the surrounding UI renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySnapshot {
    pub query: DiscoveryQuery,
    pub loading: bool,
    pub results: Vec<Course>,
    /// Non-blocking notice, e.g. "showing saved courses"
    pub notice: Option<String>,
    pub generation: u64,
}

/// Whether a finished fetch was applied to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Commit {
    Applied,
    /// Superseded by a newer query and dropped
    Stale,
}

/// A fetch issued for one generation of the query
struct Ticket {
    generation: u64,
    query: DiscoveryQuery,
    cancel_token: CancellationToken,
}

/// Output of a fetch, before it is committed
struct Derived {
    courses: Vec<Course>,
    notice: Option<String>,
    full: Option<(Arc<Vec<Course>>, ListingOrigin)>,
}

struct ViewInner {
    query: DiscoveryQuery,
    loading: bool,
    results: Vec<Course>,
    notice: Option<String>,
    generation: u64,
    /// Full collection backing the client path
    full: Option<(Arc<Vec<Course>>, ListingOrigin)>,
    in_flight: Option<CancellationToken>,
}

pub struct DiscoveryState {
    repo: Arc<CourseRepository>,
    mode: FilterMode,
    inner: RwLock<ViewInner>,
}

fn origin_notice(origin: ListingOrigin) -> Option<String> {
    match origin {
        ListingOrigin::Snapshot => {
            Some("Course service unavailable; showing saved courses".to_string())
        }
        ListingOrigin::Server | ListingOrigin::LocalFilter => None,
    }
}

const LOADED_COLLECTION_NOTICE: &str =
    "Course service unavailable; filtering the courses already loaded";

fn failure_notice(error: &CatalogError) -> String {
    match error {
        CatalogError::NetworkFailure(_) => "Failed to load courses. Please try again.".to_string(),
        other => format!("Failed to load courses: {}", other),
    }
}

impl DiscoveryState {
    pub fn new(repo: Arc<CourseRepository>, mode: FilterMode) -> Self {
        Self {
            repo,
            mode,
            inner: RwLock::new(ViewInner {
                query: DiscoveryQuery::default(),
                loading: false,
                results: Vec::new(),
                notice: None,
                generation: 0,
                full: None,
                in_flight: None,
            }),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Initial load: reset the query and show the full collection
    pub async fn load(&self) -> Commit {
        let ticket = self.begin(|query| *query = DiscoveryQuery::default()).await;
        self.settle(ticket, self.fetch_full()).await
    }

    pub async fn set_category(&self, category: impl Into<String>) -> Commit {
        let category = category.into();
        let ticket = self.begin(move |query| query.category = category).await;
        let query = ticket.query.clone();
        self.settle(ticket, self.derive(&query)).await
    }

    pub async fn set_search_term(&self, search_term: impl Into<String>) -> Commit {
        let search_term = search_term.into();
        let ticket = self.begin(move |query| query.search_term = search_term).await;
        let query = ticket.query.clone();
        self.settle(ticket, self.derive(&query)).await
    }

    pub async fn set_query(&self, new_query: DiscoveryQuery) -> Commit {
        let ticket = self.begin(move |query| *query = new_query).await;
        let query = ticket.query.clone();
        self.settle(ticket, self.derive(&query)).await
    }

    /// Back to "All" with no search: the full collection, never an empty set
    pub async fn clear(&self) -> Commit {
        self.set_query(DiscoveryQuery::default()).await
    }

    pub async fn snapshot(&self) -> DiscoverySnapshot {
        let inner = self.inner.read().await;
        DiscoverySnapshot {
            query: inner.query.clone(),
            loading: inner.loading,
            results: inner.results.clone(),
            notice: inner.notice.clone(),
            generation: inner.generation,
        }
    }

    pub async fn query(&self) -> DiscoveryQuery {
        self.inner.read().await.query.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.loading
    }

    /// Apply an edit and open a new generation; the previous fetch is cancelled
    async fn begin(&self, edit: impl FnOnce(&mut DiscoveryQuery)) -> Ticket {
        let mut inner = self.inner.write().await;
        edit(&mut inner.query);
        inner.generation += 1;
        inner.loading = true;

        if let Some(previous) = inner.in_flight.take() {
            previous.cancel();
        }
        let cancel_token = CancellationToken::new();
        inner.in_flight = Some(cancel_token.clone());

        log::debug!("Discovery generation {} for {:?}", inner.generation, inner.query);

        Ticket {
            generation: inner.generation,
            query: inner.query.clone(),
            cancel_token,
        }
    }

    async fn settle<F>(&self, ticket: Ticket, work: F) -> Commit
    where
        F: Future<Output = Result<Derived, CatalogError>>,
    {
        let outcome = tokio::select! {
            _ = ticket.cancel_token.cancelled() => {
                log::debug!("Discovery generation {} superseded before it resolved", ticket.generation);
                return Commit::Stale;
            }
            outcome = work => outcome,
        };

        self.commit(&ticket, outcome).await
    }

    async fn commit(&self, ticket: &Ticket, outcome: Result<Derived, CatalogError>) -> Commit {
        let mut inner = self.inner.write().await;

        if inner.generation != ticket.generation {
            log::debug!(
                "Discarding stale response for generation {} (current {})",
                ticket.generation,
                inner.generation
            );
            return Commit::Stale;
        }

        inner.loading = false;
        inner.in_flight = None;

        match outcome {
            Ok(derived) => {
                if let Some(full) = derived.full {
                    inner.full = Some(full);
                }
                inner.results = derived.courses;
                inner.notice = derived.notice;
            }
            Err(e) => {
                // Nothing to filter locally; whatever is on screen stays
                log::warn!("Discovery fetch for {:?} failed: {}", ticket.query, e);
                inner.notice = Some(failure_notice(&e));
            }
        }

        Commit::Applied
    }

    async fn fetch_full(&self) -> Result<Derived, CatalogError> {
        let listing = self.repo.fetch_all_courses_or_cached().await?;
        let full = Arc::new(listing.courses);
        Ok(Derived {
            courses: full.to_vec(),
            notice: origin_notice(listing.origin),
            full: Some((full, listing.origin)),
        })
    }

    async fn derive(&self, query: &DiscoveryQuery) -> Result<Derived, CatalogError> {
        match self.mode {
            FilterMode::Server => match self.repo.fetch_filtered_listing(query).await {
                Ok(listing) => {
                    let notice = origin_notice(listing.origin);
                    Ok(Derived {
                        courses: listing.courses,
                        notice,
                        full: None,
                    })
                }
                Err(e) => {
                    let loaded = self.inner.read().await.full.clone();
                    let Some((full, _)) = loaded else {
                        return Err(e);
                    };
                    log::warn!("Course service unavailable ({}), filtering the loaded collection", e);
                    Ok(Derived {
                        courses: filter_courses(&full, query),
                        notice: Some(LOADED_COLLECTION_NOTICE.to_string()),
                        full: None,
                    })
                }
            },
            FilterMode::Client => {
                let cached = self.inner.read().await.full.clone();
                let (full, origin, fresh) = match cached {
                    Some((full, origin)) => (full, origin, false),
                    None => {
                        let listing = self.repo.fetch_all_courses_or_cached().await?;
                        (Arc::new(listing.courses), listing.origin, true)
                    }
                };

                Ok(Derived {
                    courses: filter_courses(&full, query),
                    notice: origin_notice(origin),
                    full: fresh.then(|| (full.clone(), origin)),
                })
            }
        }
    }
}
