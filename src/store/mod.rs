//! Content store
//!
//! Read/write access to named content collections. Two drivers implement
//! [`ContentStore`]:
//! - [`SqlxContentStore`]: JSON documents in a local SQLite database
//! - [`RestContentStore`]: a hosted PostgREST-compatible backend

pub mod error;
pub mod query;
pub mod rest;
pub mod sqlx_store;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StoreConfig, StoreDriver};
use crate::db::{create_pool, migrations};
use crate::models::{ContentItem, Row};

pub use error::StoreError;
pub use query::{validate_identifier, Filter, OrderHint, Predicate, Query};
pub use rest::RestContentStore;
pub use sqlx_store::SqlxContentStore;

/// Collection-oriented content access
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Rows matching the query, in the store's order
    async fn fetch(&self, query: &Query) -> Result<Vec<ContentItem>, StoreError>;

    /// First matching row; zero rows is `StoreError::NotFound`
    async fn fetch_single(&self, collection: &str, filter: &Filter)
        -> Result<ContentItem, StoreError>;

    async fn insert(&self, collection: &str, row: Row) -> Result<ContentItem, StoreError>;

    /// Merge `patch` into the row with `id`. The id itself never changes.
    async fn update(&self, collection: &str, id: &str, patch: Row)
        -> Result<ContentItem, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Cheap reachability check for health endpoints
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Type alias for a shared content store
pub type DynContentStore = Arc<dyn ContentStore>;

/// Build the configured store, running migrations for the local driver
pub async fn create_store(config: &StoreConfig) -> Result<DynContentStore> {
    match config.driver {
        StoreDriver::Sqlite => {
            let pool = create_pool(&config.url).await?;
            migrations::run_migrations(&pool)
                .await
                .context("Failed to run content store migrations")?;
            tracing::info!("Using SQLite content store at {}", config.url);
            Ok(Arc::new(SqlxContentStore::new(pool)))
        }
        StoreDriver::Rest => {
            let api_key = config
                .api_key
                .clone()
                .context("store.api_key is required for the rest driver")?;
            let store = RestContentStore::new(&config.url, &api_key, config.timeout())?;
            tracing::info!("Using hosted content store at {}", config.url);
            Ok(Arc::new(store))
        }
    }
}
