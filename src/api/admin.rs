//! Admin API endpoints
//!
//! Every route here sits behind `require_admin`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::sections::parse_key;
use crate::models::{ContentItem, Row, SectionVisibility};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections/{collection}", get(list_rows).post(create_row))
        .route("/collections/{collection}/{id}", put(update_row).delete(delete_row))
        .route("/visibility/{key}", put(set_visibility))
}

/// GET /api/v1/admin/collections/{collection}
async fn list_rows(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<ContentItem>>, ApiError> {
    Ok(Json(state.admin_service.list(&collection).await?))
}

/// POST /api/v1/admin/collections/{collection}
async fn create_row(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(row): Json<Row>,
) -> Result<(StatusCode, Json<ContentItem>), ApiError> {
    let item = state.admin_service.create(&collection, row).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/v1/admin/collections/{collection}/{id}
async fn update_row(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(patch): Json<Row>,
) -> Result<Json<ContentItem>, ApiError> {
    Ok(Json(state.admin_service.update(&collection, &id, patch).await?))
}

/// DELETE /api/v1/admin/collections/{collection}/{id}
async fn delete_row(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.admin_service.delete(&collection, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct VisibilityInput {
    is_visible: bool,
}

/// PUT /api/v1/admin/visibility/{key}
async fn set_visibility(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<VisibilityInput>,
) -> Result<Json<SectionVisibility>, ApiError> {
    let key = parse_key(&key)?;
    let row = state
        .page_service
        .visibility()
        .set_visibility(key.as_str(), input.is_visible)
        .await?;
    Ok(Json(row))
}
