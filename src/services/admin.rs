//! Admin editing service
//!
//! Thin write path over the content store. Checks that the collection is
//! editable and that required fields are filled, then leaves everything else
//! to the store's schema. Each successful write drops the cached reads of the
//! collection it touched.

use serde_json::Value;

use super::sections::{has_visibility_column, is_editable, required_fields, VISIBILITY_COLLECTION};
use crate::cache::{content_pattern, CacheLayer, SharedCache};
use crate::models::{ContentItem, Row};
use crate::store::{DynContentStore, Query, StoreError};

/// Error types for admin operations
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Rejected before reaching the store
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AdminError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => AdminError::NotFound(msg),
            StoreError::InvalidQuery(msg) => AdminError::Validation(msg),
            other => AdminError::Store(other),
        }
    }
}

pub struct AdminService {
    store: DynContentStore,
    cache: SharedCache,
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn ensure_editable(collection: &str) -> Result<(), AdminError> {
    if is_editable(collection) {
        Ok(())
    } else {
        Err(AdminError::Validation(format!(
            "Collection '{}' is not editable",
            collection
        )))
    }
}

impl AdminService {
    pub fn new(store: DynContentStore, cache: SharedCache) -> Self {
        Self { store, cache }
    }

    /// Every row of `collection`, hidden ones included, straight from the store
    pub async fn list(&self, collection: &str) -> Result<Vec<ContentItem>, AdminError> {
        ensure_editable(collection)?;
        Ok(self.store.fetch(&Query::new(collection)).await?)
    }

    pub async fn create(&self, collection: &str, mut row: Row) -> Result<ContentItem, AdminError> {
        ensure_editable(collection)?;

        let missing: Vec<&str> = required_fields(collection)
            .iter()
            .copied()
            .filter(|field| is_blank(row.get(*field)))
            .collect();
        if !missing.is_empty() {
            return Err(AdminError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        if has_visibility_column(collection) {
            row.entry("is_visible").or_insert(Value::Bool(true));
        }
        if collection == VISIBILITY_COLLECTION {
            self.ensure_unique_section_key(row.get("section_key"), None).await?;
        }

        let item = self.store.insert(collection, row).await?;
        tracing::info!("Created {} row {}", collection, item.id);
        self.invalidate(collection).await;
        Ok(item)
    }

    pub async fn update(&self, collection: &str, id: &str, patch: Row) -> Result<ContentItem, AdminError> {
        ensure_editable(collection)?;

        if let Some(field) = required_fields(collection)
            .iter()
            .find(|field| patch.contains_key(**field) && is_blank(patch.get(**field)))
        {
            return Err(AdminError::Validation(format!("Field '{}' cannot be empty", field)));
        }
        if collection == VISIBILITY_COLLECTION {
            self.ensure_unique_section_key(patch.get("section_key"), Some(id)).await?;
        }

        let item = self.store.update(collection, id, patch).await?;
        tracing::info!("Updated {} row {}", collection, id);
        self.invalidate(collection).await;
        Ok(item)
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AdminError> {
        ensure_editable(collection)?;
        self.store.delete(collection, id).await?;
        tracing::info!("Deleted {} row {}", collection, id);
        self.invalidate(collection).await;
        Ok(())
    }

    /// One `section_visibility` row per section key
    async fn ensure_unique_section_key(
        &self,
        section_key: Option<&Value>,
        except_id: Option<&str>,
    ) -> Result<(), AdminError> {
        let Some(section_key) = section_key else {
            return Ok(());
        };
        let query = Query::new(VISIBILITY_COLLECTION).where_eq("section_key", section_key.clone());
        let taken = self
            .store
            .fetch(&query)
            .await?
            .into_iter()
            .any(|row| Some(row.id.as_str()) != except_id);

        if taken {
            return Err(AdminError::Store(StoreError::Conflict(format!(
                "Section '{}' already has a visibility row",
                section_key.as_str().unwrap_or_default()
            ))));
        }
        Ok(())
    }

    async fn invalidate(&self, collection: &str) {
        let pattern = content_pattern(collection);
        if let Err(e) = self.cache.delete_pattern(&pattern).await {
            tracing::warn!("Failed to invalidate {}: {}", pattern, e);
        }
        if collection == VISIBILITY_COLLECTION {
            if let Err(e) = self.cache.delete_pattern("visibility:*").await {
                tracing::warn!("Failed to invalidate visibility answers: {}", e);
            }
        }
    }
}
