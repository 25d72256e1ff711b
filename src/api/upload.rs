//! Upload API endpoint
//!
//! Accepts multipart/form-data with a single file field named "file".
//! The object path comes from `?path=`, or a random name is generated.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState};
use crate::storage::{extension_for, sanitize_path, StoredObject};

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_file_size: u64) -> Router<AppState> {
    let limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(limit))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadParams {
    pub path: Option<String>,
    pub overwrite: bool,
}

/// POST /api/v1/admin/upload?path=..&overwrite=..
async fn upload_image(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredObject>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        state
            .upload_policy
            .check(&content_type, data.len() as u64)
            .map_err(ApiError::validation_error)?;

        let path = match params.path.as_deref() {
            Some(path) => sanitize_path(path).map_err(|e| ApiError::validation_error(e.to_string()))?,
            None => format!("{}.{}", Uuid::new_v4(), extension_for(&filename, &content_type)),
        };

        let stored = state
            .storage
            .upload(&path, &data, &content_type, params.overwrite)
            .await?;
        tracing::info!("Uploaded {} ({} bytes)", stored.path, stored.size);

        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(ApiError::validation_error("No file provided"))
}
