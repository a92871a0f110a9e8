// Database module for the course catalog
// Provides SQLite persistence for the offline course snapshot

pub mod manager;
pub mod migrations;
pub mod snapshot_repo;

pub use manager::DatabaseManager;
pub use snapshot_repo::CourseSnapshot;
