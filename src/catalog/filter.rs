//! Filter engine - category + title search over a course collection
//!
//! Pure and deterministic. Shared by the client-side discovery path and the
//! repository's fallback for server-side filtering, so both produce the same
//! ordered result for the same query.

use super::models::{Course, DiscoveryQuery};

/// Whether a single course satisfies the query
pub fn matches(course: &Course, query: &DiscoveryQuery) -> bool {
    matches_with_needle(course, query.category_filter(), query.search_needle().as_deref())
}

fn matches_with_needle(course: &Course, category: Option<&str>, needle: Option<&str>) -> bool {
    if let Some(category) = category {
        // Exact, case-sensitive: categories come from a controlled vocabulary
        if course.category_or_default() != category {
            return false;
        }
    }

    match needle {
        Some(needle) => course.title.to_lowercase().contains(needle),
        None => true,
    }
}

/// Apply the query to `courses`, preserving input order
pub fn filter_courses(courses: &[Course], query: &DiscoveryQuery) -> Vec<Course> {
    // Fold the needle once rather than per course
    let category = query.category_filter();
    let needle = query.search_needle();

    courses
        .iter()
        .filter(|course| matches_with_needle(course, category, needle.as_deref()))
        .cloned()
        .collect()
}

/// Courses flagged as featured, in input order
pub fn featured_courses(courses: &[Course]) -> Vec<Course> {
    courses.iter().filter(|c| c.is_featured).cloned().collect()
}
