// Request handlers: one per JSON-RPC method

use catalog_lib::catalog::ALL_CATEGORIES;
use catalog_lib::{load_admin_stats, AppState, Commit, Course, DiscoveryQuery, RolePolicy, User};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

type HandlerResult = Result<Value, JsonRpcError>;

/// Home page size when no course is featured
const POPULAR_COURSES: usize = 6;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ListParams {
    category: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EmailParams {
    email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeaturedParams {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CategoryParams {
    category: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    search: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserParams {
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct EnrollParams {
    #[serde(default)]
    user: Option<User>,
    course: Course,
}

/// Decode params; absent params read as an empty object
fn params<T: DeserializeOwned>(value: Value) -> Result<T, JsonRpcError> {
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value).map_err(JsonRpcError::invalid_params)
}

fn to_value<T: serde::Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(crate::rpc::SERVER_ERROR, format!("Failed to encode result: {}", e)))
}

async fn handle_courses_list(state: &AppState, params: ListParams) -> HandlerResult {
    let listing = if params.category.is_none() && params.search.is_none() {
        state.repository.fetch_all_courses_or_cached().await?
    } else {
        let query = DiscoveryQuery::new(
            params.category.unwrap_or_else(|| ALL_CATEGORIES.to_string()),
            params.search.unwrap_or_default(),
        );
        state.repository.fetch_filtered_listing(&query).await?
    };

    Ok(json!({
        "courses": listing.courses,
        "origin": listing.origin,
    }))
}

async fn handle_featured(state: &AppState, params: FeaturedParams) -> HandlerResult {
    let mut courses = state.repository.fetch_popular_courses(POPULAR_COURSES).await?;
    if let Some(limit) = params.limit {
        courses.truncate(limit);
    }
    to_value(&courses)
}

async fn handle_categories(state: &AppState) -> HandlerResult {
    let vocabulary = state.repository.fetch_categories().await;
    Ok(json!({
        "categories": vocabulary.options(),
        "fallback": vocabulary.is_fallback,
    }))
}

async fn discovery_result(state: &AppState, commit: Commit) -> HandlerResult {
    let snapshot = state.discovery.snapshot().await;
    Ok(json!({
        "commit": commit,
        "snapshot": snapshot,
    }))
}

async fn handle_stats(state: &AppState, params: UserParams) -> HandlerResult {
    let stats = load_admin_stats(&state.repository, state.policy.as_ref(), params.user.as_ref()).await?;
    to_value(&stats)
}

async fn handle_enroll(state: &AppState, params: EnrollParams) -> HandlerResult {
    let outcome = state.repository.enroll(params.user.as_ref(), &params.course).await?;
    Ok(json!({ "outcome": outcome }))
}

pub async fn process_request(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest { id, method, params: raw, .. } = request;

    let result = match method.as_str() {
        "courses.list" => match params(raw) {
            Ok(p) => handle_courses_list(state, p).await,
            Err(e) => Err(e),
        },
        "courses.get" => match params::<IdParams>(raw) {
            Ok(p) => match state.repository.fetch_course_by_id(&p.id).await {
                Ok(course) => to_value(&course),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        },
        "courses.featured" => match params(raw) {
            Ok(p) => handle_featured(state, p).await,
            Err(e) => Err(e),
        },
        "courses.byInstructor" => match params::<EmailParams>(raw) {
            Ok(p) => match state.repository.fetch_instructor_courses(&p.email).await {
                Ok(courses) => to_value(&courses),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        },
        "categories.list" => handle_categories(state).await,
        "discovery.load" => {
            let commit = state.discovery.load().await;
            discovery_result(state, commit).await
        }
        "discovery.setCategory" => match params::<CategoryParams>(raw) {
            Ok(p) => {
                let commit = state.discovery.set_category(p.category).await;
                discovery_result(state, commit).await
            }
            Err(e) => Err(e),
        },
        "discovery.setSearch" => match params::<SearchParams>(raw) {
            Ok(p) => {
                let commit = state.discovery.set_search_term(p.search).await;
                discovery_result(state, commit).await
            }
            Err(e) => Err(e),
        },
        "discovery.setQuery" => match params::<DiscoveryQuery>(raw) {
            Ok(query) => {
                let commit = state.discovery.set_query(query).await;
                discovery_result(state, commit).await
            }
            Err(e) => Err(e),
        },
        "discovery.clear" => {
            let commit = state.discovery.clear().await;
            discovery_result(state, commit).await
        }
        "discovery.snapshot" => to_value(&state.discovery.snapshot().await),
        "detail.open" => match params::<IdParams>(raw) {
            Ok(p) => to_value(&state.detail.open(&p.id).await),
            Err(e) => Err(e),
        },
        "stats.get" => match params(raw) {
            Ok(p) => handle_stats(state, p).await,
            Err(e) => Err(e),
        },
        "enrollments.list" => match params::<EmailParams>(raw) {
            Ok(p) => match state.repository.fetch_enrollments(&p.email).await {
                Ok(enrollments) => to_value(&enrollments),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        },
        "enrollments.create" => match params(raw) {
            Ok(p) => handle_enroll(state, p).await,
            Err(e) => Err(e),
        },
        "session.role" => match params::<UserParams>(raw) {
            Ok(p) => Ok(json!({ "role": state.policy.role(p.user.as_ref()) })),
            Err(e) => Err(e),
        },
        "shutdown" => {
            log::info!("Shutting down...");
            Ok(json!({ "success": true }))
        }
        _ => Err(JsonRpcError::method_not_found(&method)),
    };

    match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            log::debug!("{} (id={}) failed: {}", method, id, e.message);
            JsonRpcResponse::failure(id, e)
        }
    }
}
