use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use pmx_core::{parse_checked_flag, NewItem, RecommendationItem};
use pmx_storage::{seed, snapshot, ItemStore, SeedOutcome, StorageError};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub mod config;
pub mod logging;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared handle to the item store. Created once at startup, dropped on shutdown.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Box<dyn ItemStore>>>,
}

impl AppState {
    pub fn new(store: impl ItemStore + 'static) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Item not found")]
    NotFound,
    #[error("{message}: {source}")]
    Storage {
        message: &'static str,
        #[source]
        source: StorageError,
    },
}

impl ApiError {
    fn storage(message: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| ApiError::Storage { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, *message),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Item not found"),
            ApiError::Storage { message, source } => {
                error!(event = "store_error", context = %message, error = %source);
                (StatusCode::INTERNAL_SERVER_ERROR, *message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: i64,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct UpdatedResponse {
    message: &'static str,
    changes: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/priority-items.json", get(snapshot_handler))
        .route("/api/priority-items", get(list_items).post(create_item))
        .route("/api/priority-items/:id", patch(update_item))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Seeds an empty store. Failures are logged and leave the store as it was.
pub fn ensure_seeded(store: &dyn ItemStore) -> Option<SeedOutcome> {
    match seed(store) {
        Ok(outcome @ SeedOutcome::Seeded { inserted }) => {
            info!(event = "seed_complete", inserted);
            Some(outcome)
        }
        Ok(outcome @ SeedOutcome::Skipped { existing }) => {
            debug!(event = "seed_skipped", existing);
            Some(outcome)
        }
        Err(err) => {
            error!(event = "seed_failed", error = %err);
            None
        }
    }
}

async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecommendationItem>>, ApiError> {
    let store = state.store.lock().await;
    let items = store
        .list_all()
        .map_err(ApiError::storage("Failed to fetch items"))?;
    Ok(Json(items))
}

async fn create_item(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let item = parse_new_item(&body)?;
    let store = state.store.lock().await;
    let id = store
        .insert(&item)
        .map_err(ApiError::storage("Failed to create item"))?;
    info!(event = "item_created", id, category = %item.category);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            message: "Item created successfully",
        }),
    ))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let is_checked = parse_checked_body(&body)?;
    let Ok(id) = id.trim().parse::<i64>() else {
        return Err(ApiError::NotFound);
    };

    let store = state.store.lock().await;
    let changes = store
        .set_checked(id, is_checked)
        .map_err(ApiError::storage("Failed to update item"))?;
    if changes == 0 {
        warn!(event = "item_not_found", id);
        return Err(ApiError::NotFound);
    }
    info!(event = "item_updated", id, is_checked, changes);
    Ok(Json(UpdatedResponse {
        message: "Item updated successfully",
        changes,
    }))
}

async fn snapshot_handler() -> Result<impl IntoResponse, ApiError> {
    let body = snapshot::snapshot_json().map_err(ApiError::storage("Failed to load snapshot"))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

fn parse_object(body: &[u8]) -> Result<Value, ApiError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| ApiError::BadRequest("Invalid request body"))?;
    if !value.is_object() {
        return Err(ApiError::BadRequest("Invalid request body"));
    }
    Ok(value)
}

fn parse_new_item(body: &[u8]) -> Result<NewItem, ApiError> {
    let value = parse_object(body)?;
    serde_json::from_value(value).map_err(|_| ApiError::BadRequest("Invalid request body"))
}

fn parse_checked_body(body: &[u8]) -> Result<bool, ApiError> {
    let value = parse_object(body)?;
    value
        .get("is_checked")
        .and_then(parse_checked_flag)
        .ok_or(ApiError::BadRequest("is_checked must be a boolean"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_body_accepts_booleans_and_binary_integers() {
        assert!(parse_checked_body(br#"{"is_checked": true}"#).expect("bool"));
        assert!(!parse_checked_body(br#"{"is_checked": 0}"#).expect("int"));
        assert!(parse_checked_body(br#"{"is_checked": "true"}"#).is_err());
        assert!(parse_checked_body(br#"{"is_checked": 7}"#).is_err());
        assert!(parse_checked_body(br#"{}"#).is_err());
        assert!(parse_checked_body(br#"[true]"#).is_err());
        assert!(parse_checked_body(b"").is_err());
    }

    #[test]
    fn new_item_body_is_permissive_about_missing_fields() {
        let item = parse_new_item(br#"{"category": "X"}"#).expect("parse");
        assert_eq!(item.category, "X");
        assert_eq!(item.item_text, "");
        assert!(parse_new_item(br#"{"category": 5}"#).is_err());
        assert!(parse_new_item(b"null").is_err());
    }
}
