//! Catalog models - Course, Instructor, DiscoveryQuery, CategoryVocabulary, Enrollment
//!
//! Shapes mirror the REST API's JSON documents. Decoding is lenient: the
//! backing store keeps form input verbatim, so numbers may arrive as strings
//! and ids may arrive as `_id` or `id`.

use serde::{Deserialize, Serialize};

/// Sentinel category meaning "no category constraint"
pub const ALL_CATEGORIES: &str = "All";

/// Category assumed for a course that carries none
pub const DEFAULT_CATEGORY: &str = "General";

/// Vocabulary used when the category service is unavailable
pub const FALLBACK_CATEGORIES: [&str; 3] = ["Web Development", "Data Science", "Mobile Development"];

/// Instructor sub-record embedded in a course
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// A catalog item that users can browse and enroll in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CourseDocument")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub enrolled_students: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub is_featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<Instructor>,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Course as stored. `_id` and `id` are read separately so a document
/// carrying both decodes, with the store key taking precedence.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseDocument {
    #[serde(rename = "_id", default, deserialize_with = "lenient::id_opt")]
    store_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::id_opt")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    title: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient::price_opt")]
    price: Option<f64>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    enrolled_students: u64,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    is_featured: bool,
    #[serde(default)]
    instructor: Option<Instructor>,
    #[serde(rename = "imageURL", default)]
    image_url: Option<String>,
}

impl TryFrom<CourseDocument> for Course {
    type Error = String;

    fn try_from(doc: CourseDocument) -> Result<Self, Self::Error> {
        let id = doc
            .store_id
            .or(doc.id)
            .ok_or_else(|| "course id must be a string, number or ObjectId".to_string())?;

        Ok(Self {
            id,
            title: doc.title,
            category: doc.category,
            description: doc.description,
            price: doc.price,
            duration: doc.duration,
            enrolled_students: doc.enrolled_students,
            rating: doc.rating,
            is_featured: doc.is_featured,
            instructor: doc.instructor,
            image_url: doc.image_url,
        })
    }
}

impl Course {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            description: None,
            price: None,
            duration: None,
            enrolled_students: 0,
            rating: None,
            is_featured: false,
            instructor: None,
            image_url: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Category used for matching and grouping; absent means "General"
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    /// Absent price means the course is free
    /// Price for arithmetic: missing, negative and non-finite prices count as free
    pub fn price_or_zero(&self) -> f64 {
        self.price.filter(|p| p.is_finite() && *p > 0.0).unwrap_or(0.0)
    }

    pub fn is_free(&self) -> bool {
        self.price_or_zero() <= 0.0
    }
}

/// The user's current filter intent: `(category, search term)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryQuery {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub search_term: String,
}

fn default_category() -> String {
    ALL_CATEGORIES.to_string()
}

impl Default for DiscoveryQuery {
    fn default() -> Self {
        Self {
            category: default_category(),
            search_term: String::new(),
        }
    }
}

impl DiscoveryQuery {
    pub fn new(category: impl Into<String>, search_term: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            search_term: search_term.into(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_search_term(mut self, search_term: impl Into<String>) -> Self {
        self.search_term = search_term.into();
        self
    }

    /// Category constraint, or `None` when the sentinel "All" is selected
    pub fn category_filter(&self) -> Option<&str> {
        if self.category == ALL_CATEGORIES {
            None
        } else {
            Some(self.category.as_str())
        }
    }

    /// Trimmed, case-folded search needle; `None` for blank input
    pub fn search_needle(&self) -> Option<String> {
        let trimmed = self.search_term.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }

    /// True when the query selects the whole collection
    pub fn is_unconstrained(&self) -> bool {
        self.category_filter().is_none() && self.search_needle().is_none()
    }

    /// Request parameters for server-side filtering (`GET /courses`)
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category) = self.category_filter() {
            params.push(("category", category.to_string()));
        }
        let trimmed = self.search_term.trim();
        if !trimmed.is_empty() {
            params.push(("search", trimmed.to_string()));
        }
        params
    }
}

/// Ordered category names, presented behind the synthetic "All" option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    names: Vec<String>,
    /// True when the names came from the hard-coded fallback list
    pub is_fallback: bool,
}

impl CategoryVocabulary {
    /// Build from raw names; blanks are dropped and duplicates keep their first position
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || name == ALL_CATEGORIES {
                continue;
            }
            if !unique.iter().any(|n| n == name) {
                unique.push(name.to_string());
            }
        }

        Self {
            names: unique,
            is_fallback: false,
        }
    }

    pub fn fallback() -> Self {
        Self {
            is_fallback: true,
            ..Self::from_names(FALLBACK_CATEGORIES)
        }
    }

    /// Category names without the sentinel
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Selectable options: "All" followed by the names in order
    pub fn options(&self) -> Vec<String> {
        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(self.names.iter().cloned())
            .collect()
    }

    pub fn contains(&self, category: &str) -> bool {
        category == ALL_CATEGORIES || self.names.iter().any(|n| n == category)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Enrollment request body for `POST /enrollments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequest {
    pub course_id: String,
    pub user_email: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub course_title: String,
}

/// An enrollment record as returned by `GET /enrollments/{email}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "EnrollmentDocument")]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub course_id: String,
    pub user_email: String,
    pub user_name: Option<String>,
    pub course_title: Option<String>,
    pub enrolled_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrollmentDocument {
    #[serde(rename = "_id", default, deserialize_with = "lenient::id_opt")]
    store_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::id_opt")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::id")]
    course_id: String,
    user_email: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    course_title: Option<String>,
    #[serde(default)]
    enrolled_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<EnrollmentDocument> for Enrollment {
    fn from(doc: EnrollmentDocument) -> Self {
        Self {
            id: doc.store_id.or(doc.id),
            course_id: doc.course_id,
            user_email: doc.user_email,
            user_name: doc.user_name,
            course_title: doc.course_title,
            enrolled_at: doc.enrolled_at,
        }
    }
}

/// Result of an enrollment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollOutcome {
    Enrolled,
    AlreadyEnrolled,
}

/// Tolerant field decoders for documents written straight from HTML forms
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn id_from_value(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            // Extended JSON ObjectId: {"$oid": "..."}
            Value::Object(map) => map.get("$oid").and_then(|v| v.as_str()).map(str::to_string),
            _ => None,
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        id_from_value(Value::deserialize(d)?)
            .ok_or_else(|| serde::de::Error::custom("course id must be a string, number or ObjectId"))
    }

    pub fn id_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(id_from_value(Value::deserialize(d)?))
    }

    pub fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }

    pub fn f64_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite()))
    }

    /// Negative prices are form noise; they decode as "no price"
    pub fn price_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(f64_opt(d)?.filter(|v| *v >= 0.0))
    }

    pub fn u64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
                .unwrap_or(0),
            Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
            _ => 0,
        })
    }

    pub fn bool_or_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        })
    }
}
