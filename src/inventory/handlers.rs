//! REST API handlers for the produce collections
//!
//! This module implements the `/api/{type}` endpoints: listing with
//! filters, adding a single item and removing one by id.

use super::{importer::Row, models::*, state::SharedState};
use crate::error::InventoryError;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Creates routes for collection operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/:kind", get(list_items).post(add_item))
        .route("/api/:kind/:id", delete(remove_item))
}

// =============================================================================
// Errors
// =============================================================================

/// Error body: `{"error": "..."}`
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Failures surfaced to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// Path names a collection other than fruit / vegetable
    UnknownCollection,
    /// Malformed request or rejected item (400)
    BadRequest(String),
    /// Bootstrap or other server-side failure (500)
    Internal(String),
}

impl From<InventoryError> for ApiError {
    fn from(e: InventoryError) -> Self {
        if e.is_bad_input() {
            ApiError::BadRequest(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::UnknownCollection => {
                (StatusCode::NOT_FOUND, "Unknown collection".to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

fn resolve_kind(raw: &str) -> Result<ItemKind, ApiError> {
    ItemKind::parse(raw).ok_or(ApiError::UnknownCollection)
}

// =============================================================================
// Query Validation
// =============================================================================

/// Validates listing query parameters into [`ListFilters`].
///
/// * `q` is trimmed
/// * `min` / `max` must be plain digit strings (grams)
/// * `unit` must be `g` or `kg`, case-insensitive
/// * `min` may not exceed `max`
pub fn parse_filters(params: &HashMap<String, String>) -> Result<ListFilters, ApiError> {
    let mut filters = ListFilters {
        q: params.get("q").map(|q| q.trim().to_string()),
        ..Default::default()
    };

    filters.min = params
        .get("min")
        .map(|v| parse_grams(v, "min"))
        .transpose()?;
    filters.max = params
        .get("max")
        .map(|v| parse_grams(v, "max"))
        .transpose()?;

    if let Some(unit) = params.get("unit") {
        filters.unit = unit.parse().map_err(|_| {
            ApiError::BadRequest("Parameter 'unit' must be 'g' or 'kg'".to_string())
        })?;
    }

    if let (Some(min), Some(max)) = (filters.min, filters.max) {
        if min > max {
            return Err(ApiError::BadRequest(
                "Parameter 'min' cannot be greater than 'max'".to_string(),
            ));
        }
    }

    Ok(filters)
}

fn parse_grams(raw: &str, name: &str) -> Result<u64, ApiError> {
    let rejected =
        || ApiError::BadRequest(format!("Parameter '{}' must be a positive integer (grams)", name));

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(rejected());
    }
    raw.parse().map_err(|_| rejected())
}

// =============================================================================
// Handlers
// =============================================================================

/// Endpoint: GET /api/{type}
/// Lists the collection, filtered and rendered per the query string.
async fn list_items(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<ItemRow>>, ApiError> {
    let kind = resolve_kind(&kind)?;
    let filters = parse_filters(&params)?;

    let rows = state.storage.collection(kind).list(&filters);
    tracing::debug!("Listed {} {} item(s)", rows.len(), kind);

    Ok(Json(rows))
}

/// Endpoint: POST /api/{type}
/// Validates the body as a single import row. The row is stored in the
/// collection named by its own `type`; the path only has to name a known
/// collection.
async fn add_item(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let path_kind = resolve_kind(&kind)?;

    // A JSON array carries no named keys and fails the key check below.
    let row = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(row)) => row,
        Ok(Value::Array(_)) => Row::new(),
        _ => return Err(ApiError::BadRequest("Invalid JSON".to_string())),
    };

    let stored = state.importer.import_row(&row).map_err(|e| {
        tracing::warn!("Rejected item posted to {}: {}", path_kind, e);
        ApiError::from(e)
    })?;
    if stored != path_kind {
        tracing::debug!("Item posted to {} stored as {}", path_kind, stored);
    }

    Ok((StatusCode::CREATED, Json(StatusResponse { status: "ok" })))
}

/// Endpoint: DELETE /api/{type}/{id}
/// Removes an item; removing an absent id is not an error.
async fn remove_item(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = resolve_kind(&kind)?;
    let id: u64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid id '{}'", id)))?;

    if state.storage.collection_mut(kind).remove(id) {
        tracing::info!("Removed {} {}", kind, id);
    }

    Ok(StatusCode::NO_CONTENT)
}
