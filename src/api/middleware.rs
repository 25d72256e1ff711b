//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope
//! - Bearer token authorization for admin routes

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::{create_cache, SharedCache};
use crate::config::Config;
use crate::render::{RenderOptions, SiteTemplates};
use crate::services::{AdminError, AdminService, PageService};
use crate::storage::{create_storage, DynObjectStorage, UploadPolicy};
use crate::store::{create_store, DynContentStore, StoreError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub store: DynContentStore,
    pub page_service: Arc<PageService>,
    pub admin_service: Arc<AdminService>,
    pub templates: Arc<SiteTemplates>,
    pub storage: DynObjectStorage,
    pub upload_policy: Arc<UploadPolicy>,
    /// `None` disables the admin surface
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Wire the services around already constructed backends
    pub fn new(
        config: &Config,
        store: DynContentStore,
        cache: SharedCache,
        storage: DynObjectStorage,
        templates: SiteTemplates,
    ) -> Self {
        let page_service = PageService::new(
            store.clone(),
            cache.clone(),
            config.store.timeout(),
            config.site.title.clone(),
            RenderOptions::from_config(&config.site),
        );
        let admin_token = config
            .admin
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Arc::from);
        if admin_token.is_none() {
            tracing::info!("No admin token configured, admin API disabled");
        }

        Self {
            admin_service: Arc::new(AdminService::new(store.clone(), cache)),
            page_service: Arc::new(page_service),
            store,
            templates: Arc::new(templates),
            storage,
            upload_policy: Arc::new(UploadPolicy::from_config(&config.storage)),
            admin_token,
        }
    }

    /// Build every backend from configuration
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = create_store(&config.store)
            .await
            .context("Failed to initialize content store")?;
        let cache = create_cache(&config.cache);
        let storage = create_storage(&config.storage, &config.store)
            .context("Failed to initialize object storage")?;
        let templates = SiteTemplates::load(&config.site.templates_path)
            .context("Failed to load site templates")?;

        Ok(Self::new(config, store, cache, storage, templates))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::NotFound(_) => ApiError::not_found(e.to_string()),
            StoreError::Conflict(_) => ApiError::conflict(e.to_string()),
            StoreError::InvalidQuery(_) => ApiError::validation_error(e.to_string()),
            StoreError::Upload(_) if e.is_collision() => ApiError::conflict(e.to_string()),
            StoreError::Fetch(_) | StoreError::Upload(_) => {
                tracing::error!("Store request failed: {}", e);
                ApiError::internal_error(e.to_string())
            }
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(e: AdminError) -> Self {
        match e {
            AdminError::Validation(msg) => ApiError::validation_error(msg),
            AdminError::NotFound(msg) => ApiError::not_found(msg),
            AdminError::Store(inner) => inner.into(),
        }
    }
}

fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Compare without short-circuiting on the first differing byte
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Admin authorization middleware
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state
        .admin_token
        .as_deref()
        .ok_or_else(|| ApiError::forbidden("Admin API is disabled"))?;

    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        tracing::warn!("Rejected admin request to {}", request.uri().path());
        return Err(ApiError::unauthorized("Invalid token"));
    }

    Ok(next.run(request).await)
}
