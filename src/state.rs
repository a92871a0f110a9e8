// State management for the course catalog

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::access::{AllowListPolicy, RolePolicy};
use crate::catalog::http_source::HttpCourseSource;
use crate::catalog::repository::CourseRepository;
use crate::catalog::source::CourseSource;
use crate::config::CatalogConfig;
use crate::database::DatabaseManager;
use crate::discovery::{DetailLookup, DiscoveryState};

pub struct AppState {
    config: CatalogConfig,
    /// Offline snapshot cache, absent when disabled or unavailable
    database: Option<Arc<DatabaseManager>>,
    pub repository: Arc<CourseRepository>,
    pub discovery: Arc<DiscoveryState>,
    pub detail: Arc<DetailLookup>,
    pub policy: Arc<dyn RolePolicy>,
}

impl AppState {
    /// Build the pipeline against the REST API described by `config`
    pub fn from_config(config: CatalogConfig) -> Result<Self> {
        let source = HttpCourseSource::new(config.http_source_config())
            .context("Failed to create course API client")?;
        let database = open_cache(&config);

        log::info!(
            "Course catalog using {} ({:?} filtering, cache {})",
            config.base_url,
            config.filter_mode,
            if database.is_some() { "on" } else { "off" }
        );

        Ok(Self::with_source(config, Arc::new(source), database))
    }

    /// Build the pipeline over any source; used by tests and embedders
    pub fn with_source(
        config: CatalogConfig,
        source: Arc<dyn CourseSource>,
        database: Option<Arc<DatabaseManager>>,
    ) -> Self {
        let mut repository = CourseRepository::new(source);
        if let Some(db) = &database {
            repository = repository.with_cache(db.clone());
        }
        let repository = Arc::new(repository);

        let policy = AllowListPolicy::new(&config.admin_emails)
            .with_development_override(config.development_override);

        Self {
            discovery: Arc::new(DiscoveryState::new(repository.clone(), config.filter_mode)),
            detail: Arc::new(DetailLookup::new(repository.clone())),
            policy: Arc::new(policy),
            repository,
            database,
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn database(&self) -> Option<&Arc<DatabaseManager>> {
        self.database.as_ref()
    }
}

/// The cache is optional: failing to open it only costs offline fallback
fn open_cache(config: &CatalogConfig) -> Option<Arc<DatabaseManager>> {
    if !config.cache_enabled {
        return None;
    }

    match DatabaseManager::new(config.cache_path.clone()) {
        Ok(db) => Some(Arc::new(db)),
        Err(e) => {
            log::warn!(
                "Failed to open course cache at {}: {:#}",
                config.cache_path.display(),
                e
            );
            None
        }
    }
}
