// Course Catalog - course discovery pipeline for the course marketplace
//
// - Repository client over the marketplace REST API, with fallbacks
// - Category and title-search filtering shared by server and client paths
// - Discovery view state that never shows a superseded response
// - Course detail lookup keeping "not found" apart from network failures

// Performance logging macros - exported for use by other modules
#[macro_use]
pub mod macros;

pub mod access;
pub mod catalog;
pub mod config;
pub mod database;
pub mod discovery;
pub mod state;
pub mod stats;

pub use access::{AllowListPolicy, Role, RolePolicy, User};
pub use catalog::{
    filter_courses, CatalogError, CategoryVocabulary, Course, CourseRepository, CourseSource,
    DiscoveryQuery, HttpCourseSource,
};
pub use config::CatalogConfig;
pub use discovery::{Commit, DetailLookup, DetailView, DiscoverySnapshot, DiscoveryState, FilterMode};
pub use state::AppState;
pub use stats::{load_admin_stats, CatalogStats};
