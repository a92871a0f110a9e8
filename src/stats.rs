//! Admin dashboard statistics over the course collection

use serde::Serialize;

use crate::access::{RolePolicy, User};
use crate::catalog::models::Course;
use crate::catalog::repository::CourseRepository;
use crate::catalog::source::CatalogError;

const RECENT_COURSES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_courses: usize,
    pub total_enrollments: u64,
    pub total_revenue: f64,
    /// In order of first appearance
    pub category_distribution: Vec<CategoryCount>,
    pub recent_courses: Vec<Course>,
}

impl CatalogStats {
    pub fn from_courses(courses: &[Course]) -> Self {
        let mut category_distribution: Vec<CategoryCount> = Vec::new();
        for course in courses {
            let category = course.category_or_default();
            match category_distribution.iter_mut().find(|c| c.category == category) {
                Some(entry) => entry.count += 1,
                None => category_distribution.push(CategoryCount {
                    category: category.to_string(),
                    count: 1,
                }),
            }
        }

        Self {
            total_courses: courses.len(),
            total_enrollments: courses
                .iter()
                .fold(0u64, |total, c| total.saturating_add(c.enrolled_students)),
            total_revenue: total_revenue(courses),
            category_distribution,
            recent_courses: courses.iter().take(RECENT_COURSES).cloned().collect(),
        }
    }
}

/// Sum of price times enrollment, capped at `f64::MAX` so it always serializes
fn total_revenue(courses: &[Course]) -> f64 {
    courses
        .iter()
        .fold(0.0f64, |total, c| {
            total + c.price_or_zero() * c.enrolled_students as f64
        })
        .min(f64::MAX)
}

/// Statistics for the admin dashboard; non-admins are refused before any fetch
pub async fn load_admin_stats(
    repo: &CourseRepository,
    policy: &dyn RolePolicy,
    user: Option<&User>,
) -> Result<CatalogStats, CatalogError> {
    if !policy.is_admin(user) {
        let who = user.map(|u| u.email.as_str()).unwrap_or("anonymous");
        log::warn!("Refused admin statistics for {}", who);
        return Err(CatalogError::Unauthorized("admin access required".to_string()));
    }

    let listing = repo.fetch_all_courses_or_cached().await?;
    Ok(CatalogStats::from_courses(&listing.courses))
}
