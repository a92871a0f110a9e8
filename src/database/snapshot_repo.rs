// Course snapshot repository
// Persists the last successfully fetched course list for offline fallback

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseManager;
use crate::catalog::models::Course;

const FETCHED_AT_KEY: &str = "courses.fetched_at";

/// A cached course list and when it was fetched
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSnapshot {
    pub courses: Vec<Course>,
    pub fetched_at: DateTime<Utc>,
}

impl DatabaseManager {
    /// Replace the cached course list
    pub fn save_course_snapshot(&self, courses: &[Course]) -> Result<()> {
        self.with_connection(|conn| {
            save_course_snapshot_impl(conn, courses, Utc::now())
        })
    }

    /// Load the cached course list, if one was ever saved
    pub fn load_course_snapshot(&self) -> Result<Option<CourseSnapshot>> {
        self.with_connection(|conn| {
            load_course_snapshot_impl(conn)
        })
    }

    /// Drop the cached course list
    pub fn clear_course_snapshot(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM course_snapshot", [])
                .context("Failed to clear course snapshot")?;
            conn.execute("DELETE FROM snapshot_meta WHERE key = ?", params![FETCHED_AT_KEY])
                .context("Failed to clear snapshot metadata")?;
            Ok(())
        })
    }
}

fn save_course_snapshot_impl(
    conn: &Connection,
    courses: &[Course],
    fetched_at: DateTime<Utc>,
) -> Result<()> {
    let tx = conn.unchecked_transaction()
        .context("Failed to start snapshot transaction")?;

    tx.execute("DELETE FROM course_snapshot", [])
        .context("Failed to clear previous snapshot")?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO course_snapshot (position, course_id, document) VALUES (?1, ?2, ?3)"
        ).context("Failed to prepare snapshot insert")?;

        for (position, course) in courses.iter().enumerate() {
            let document = serde_json::to_string(course)
                .context("Failed to serialize course")?;
            stmt.execute(params![position as i64, course.id, document])
                .with_context(|| format!("Failed to cache course {}", course.id))?;
        }
    }

    tx.execute(
        r#"INSERT INTO snapshot_meta (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
           ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        params![FETCHED_AT_KEY, fetched_at.to_rfc3339()],
    ).context("Failed to record snapshot time")?;

    tx.commit().context("Failed to commit course snapshot")?;

    log::debug!("Cached {} courses", courses.len());
    Ok(())
}

fn load_course_snapshot_impl(conn: &Connection) -> Result<Option<CourseSnapshot>> {
    let fetched_at: Option<String> = conn.query_row(
        "SELECT value FROM snapshot_meta WHERE key = ?",
        params![FETCHED_AT_KEY],
        |row| row.get(0),
    ).optional().context("Failed to read snapshot metadata")?;

    let Some(fetched_at) = fetched_at else {
        return Ok(None);
    };

    let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
        .context("Invalid snapshot timestamp")?
        .with_timezone(&Utc);

    let mut stmt = conn.prepare(
        "SELECT course_id, document FROM course_snapshot ORDER BY position ASC"
    ).context("Failed to prepare snapshot query")?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    }).context("Failed to query course snapshot")?;

    let mut courses = Vec::new();
    for row in rows {
        let (course_id, document) = row.context("Failed to read snapshot row")?;
        match serde_json::from_str::<Course>(&document) {
            Ok(course) => courses.push(course),
            Err(e) => log::warn!("Skipping unreadable cached course {}: {}", course_id, e),
        }
    }

    Ok(Some(CourseSnapshot { courses, fetched_at }))
}
