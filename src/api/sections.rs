//! Public section API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::time::Duration;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{SectionKey, SectionVisibility};
use crate::render::{render_section, SectionView};
use crate::services::spec_for;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sections/{key}", get(get_section))
        .route("/visibility/{key}", get(get_visibility))
        .route("/health", get(health))
}

/// Unknown keys never reach the store
pub(crate) fn parse_key(key: &str) -> Result<SectionKey, ApiError> {
    key.parse()
        .map_err(|_| ApiError::not_found(format!("Unknown section: {}", key)))
}

/// GET /api/v1/sections/{key} - Rendered section, `null` when hidden or empty
async fn get_section(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Option<SectionView>>, ApiError> {
    let key = parse_key(&key)?;
    let spec = spec_for(key).ok_or_else(|| {
        ApiError::validation_error(format!("'{}' is not a list section", key))
    })?;

    let pages = &state.page_service;
    let (content, visible) = tokio::join!(
        pages.loader().load(spec),
        pages.visibility().is_visible(key.as_str()),
    );

    Ok(Json(render_section(spec, visible, &content, pages.options())))
}

/// GET /api/v1/visibility/{key}
async fn get_visibility(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SectionVisibility>, ApiError> {
    let key = parse_key(&key)?;
    let is_visible = state.page_service.visibility().is_visible(key.as_str()).await;
    Ok(Json(SectionVisibility {
        section_key: key.as_str().to_string(),
        is_visible,
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    version: &'static str,
}

/// GET /api/v1/health
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let reachable = match tokio::time::timeout(HEALTH_TIMEOUT, state.store.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!("Health check: store unreachable: {}", e);
            false
        }
        Err(_) => {
            tracing::warn!("Health check: store ping timed out");
            false
        }
    };

    let (status, body) = if reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        status,
        Json(HealthResponse {
            status: body,
            store: if reachable { "ok" } else { "unreachable" },
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
