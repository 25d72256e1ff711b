//! Cache layer
//!
//! Fetched section lists and visibility answers are memoised in process for
//! the configured staleness window. Admin writes invalidate by key pattern.
//!
//! # Usage
//!
//! ```rust,ignore
//! use folio::cache::{create_cache, CacheLayer};
//! use folio::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("visibility:skills", &true, cache.default_ttl()).await?;
//! cache.delete_pattern("content:skills:*").await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::{glob_match, MemoryCache};

/// Cache layer trait
///
/// The methods are generic, so implementations are used through concrete
/// types rather than `dyn CacheLayer`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every key matching a glob (`*`, `?`)
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Shared handle used by the services
pub type SharedCache = Arc<MemoryCache>;

/// Key under which a section list is memoised
pub fn content_key(collection: &str, query_key: &str) -> String {
    format!("content:{}:{}", collection, query_key)
}

/// Pattern covering every memoised read of one collection
pub fn content_pattern(collection: &str) -> String {
    format!("content:{}:*", collection)
}

pub fn visibility_key(section_key: &str) -> String {
    format!("visibility:{}", section_key)
}

/// Create the cache from configuration
pub fn create_cache(config: &CacheConfig) -> SharedCache {
    tracing::info!(
        "Using in-memory cache (ttl {}s, capacity {})",
        config.ttl_seconds,
        config.max_capacity
    );
    Arc::new(MemoryCache::new(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}
