//! Object storage for uploaded images
//!
//! Uploads never replace an existing object unless asked to. Destination
//! paths are sanitised before any driver sees them.

pub mod local;
pub mod rest;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{StorageConfig, StorageDriver, StoreConfig};
use crate::store::StoreError;

pub use local::LocalStorage;
pub use rest::RestStorage;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> Result<StoredObject, StoreError>;

    /// Public URL for an already sanitised path
    fn public_url(&self, path: &str) -> String;
}

pub type DynObjectStorage = Arc<dyn ObjectStorage>;

/// Normalise an object path, rejecting traversal and absolute paths
pub fn sanitize_path(path: &str) -> Result<String, StoreError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Upload("empty object path".to_string()));
    }
    if trimmed.starts_with('/') || trimmed.starts_with('\\') || trimmed.contains(':') {
        return Err(StoreError::Upload(format!("absolute object path: {}", trimmed)));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StoreError::Upload(format!("invalid object path: {}", trimmed)));
        }
        if segment.contains('\\') || segment.chars().any(char::is_control) {
            return Err(StoreError::Upload(format!("invalid object path: {}", trimmed)));
        }
        segments.push(segment);
    }
    Ok(segments.join("/"))
}

/// MIME type and size limits applied before an upload
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed_types: Vec<String>,
    pub max_file_size: u64,
}

impl UploadPolicy {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            allowed_types: config.allowed_types.clone(),
            max_file_size: config.max_file_size,
        }
    }

    pub fn is_type_allowed(&self, content_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == content_type)
    }

    /// Human-readable reason when the upload is refused
    pub fn check(&self, content_type: &str, size: u64) -> Result<(), String> {
        if !self.is_type_allowed(content_type) {
            return Err(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                content_type, self.allowed_types
            ));
        }
        if size > self.max_file_size {
            return Err(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                self.max_file_size,
                self.max_file_size / 1024 / 1024
            ));
        }
        Ok(())
    }
}

/// File extension for an upload, preferring the declared MIME type
pub fn extension_for(filename: &str, content_type: &str) -> String {
    let from_mime = match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/avif" => Some("avif"),
        "image/x-icon" => Some("ico"),
        _ => None,
    };
    if let Some(ext) = from_mime {
        return ext.to_string();
    }

    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() < 10 => ext.to_lowercase(),
        _ => "bin".to_string(),
    }
}

/// Guess a MIME type from a file name
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Build the configured storage driver. The hosted driver shares the
/// content store's base URL and key.
pub fn create_storage(storage: &StorageConfig, store: &StoreConfig) -> Result<DynObjectStorage> {
    match storage.driver {
        StorageDriver::Local => {
            tracing::info!("Storing uploads under {:?}", storage.path);
            Ok(Arc::new(LocalStorage::new(
                storage.path.clone(),
                storage.public_base_url.clone(),
            )))
        }
        StorageDriver::Rest => {
            let api_key = store
                .api_key
                .clone()
                .context("store.api_key is required for rest storage")?;
            let client = RestStorage::new(&store.url, &api_key, &storage.bucket, store.timeout())?;
            tracing::info!("Storing uploads in bucket '{}'", storage.bucket);
            Ok(Arc::new(client))
        }
    }
}
