//! Course catalog - models, filter engine, and the repository client
//!
//! Data flows one way: a `CourseSource` answers raw JSON, the
//! `CourseRepository` shapes it into `Course` values and applies fallbacks,
//! and the filter engine narrows a collection for a `DiscoveryQuery`.

pub mod filter;
pub mod http_source;
pub mod models;
pub mod repository;
pub mod source;

pub use filter::{featured_courses, filter_courses};
pub use http_source::{HttpCourseSource, HttpSourceConfig};
pub use models::{
    CategoryVocabulary, Course, DiscoveryQuery, EnrollOutcome, Enrollment, EnrollmentRequest,
    Instructor, ALL_CATEGORIES, DEFAULT_CATEGORY, FALLBACK_CATEGORIES,
};
pub use repository::{CourseListing, CourseRepository, ListingOrigin};
pub use source::{CatalogError, CourseSource};
