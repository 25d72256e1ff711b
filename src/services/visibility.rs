//! Section visibility resolver
//!
//! A section renders unless a `section_visibility` row says otherwise.
//! Lookups that fail for any reason other than "no row" also answer
//! visible, and those answers are not memoised.

use serde_json::{json, Value};
use std::time::Duration;

use super::loader::with_timeout;
use super::sections::VISIBILITY_COLLECTION;
use crate::cache::{content_pattern, visibility_key, CacheLayer, SharedCache};
use crate::models::{Row, SectionVisibility};
use crate::store::{DynContentStore, Filter, StoreError};

pub struct VisibilityResolver {
    store: DynContentStore,
    cache: SharedCache,
    timeout: Duration,
}

impl VisibilityResolver {
    pub fn new(store: DynContentStore, cache: SharedCache, timeout: Duration) -> Self {
        Self {
            store,
            cache,
            timeout,
        }
    }

    pub async fn is_visible(&self, section_key: &str) -> bool {
        let key = visibility_key(section_key);
        if let Ok(Some(visible)) = self.cache.get::<bool>(&key).await {
            tracing::debug!("Cache hit: {}", key);
            return visible;
        }

        let filter = Filter::new().eq("section_key", section_key);
        let result = with_timeout(
            self.timeout,
            self.store.fetch_single(VISIBILITY_COLLECTION, &filter),
        )
        .await;

        let visible = match result {
            Ok(row) => row.is_visible,
            Err(e) if e.is_not_found() => true,
            Err(e) => {
                tracing::warn!(section = %section_key, error = %e, "Visibility lookup failed, showing section");
                return true;
            }
        };

        if let Err(e) = self.cache.set(&key, &visible, self.cache.default_ttl()).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        visible
    }

    /// Create or update the section's row, then drop the memoised answer
    pub async fn set_visibility(
        &self,
        section_key: &str,
        visible: bool,
    ) -> Result<SectionVisibility, StoreError> {
        let filter = Filter::new().eq("section_key", section_key);

        let mut patch = Row::new();
        patch.insert("is_visible".to_string(), Value::Bool(visible));

        let existing = with_timeout(
            self.timeout,
            self.store.fetch_single(VISIBILITY_COLLECTION, &filter),
        )
        .await;

        match existing {
            Ok(existing) => {
                with_timeout(
                    self.timeout,
                    self.store.update(VISIBILITY_COLLECTION, &existing.id, patch),
                )
                .await?;
            }
            Err(e) if e.is_not_found() => {
                patch.insert("section_key".to_string(), json!(section_key));
                with_timeout(self.timeout, self.store.insert(VISIBILITY_COLLECTION, patch)).await?;
            }
            Err(e) => return Err(e),
        }

        self.invalidate(section_key).await;
        tracing::info!("Section '{}' visibility set to {}", section_key, visible);

        Ok(SectionVisibility {
            section_key: section_key.to_string(),
            is_visible: visible,
        })
    }

    pub async fn invalidate(&self, section_key: &str) {
        let key = visibility_key(section_key);
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!("Failed to invalidate {}: {}", key, e);
        }
        if let Err(e) = self.cache.delete_pattern(&content_pattern(VISIBILITY_COLLECTION)).await {
            tracing::warn!("Failed to invalidate visibility rows: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::ContentItem;
    use crate::store::{ContentStore, Query, SqlxContentStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct UnreachableStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for UnreachableStore {
        async fn fetch(&self, _query: &Query) -> Result<Vec<ContentItem>, StoreError> {
            Err(StoreError::Fetch("HTTP 503".to_string()))
        }

        async fn fetch_single(&self, _c: &str, _f: &Filter) -> Result<ContentItem, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Fetch("HTTP 503".to_string()))
        }

        async fn insert(&self, _c: &str, _row: Row) -> Result<ContentItem, StoreError> {
            Err(StoreError::Fetch("HTTP 503".to_string()))
        }

        async fn update(&self, _c: &str, _id: &str, _p: Row) -> Result<ContentItem, StoreError> {
            Err(StoreError::Fetch("HTTP 503".to_string()))
        }

        async fn delete(&self, _c: &str, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::Fetch("HTTP 503".to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Fetch("HTTP 503".to_string()))
        }
    }

    /// Store that never answers
    struct HangingStore;

    #[async_trait]
    impl ContentStore for HangingStore {
        async fn fetch(&self, _query: &Query) -> Result<Vec<ContentItem>, StoreError> {
            std::future::pending().await
        }

        async fn fetch_single(&self, _c: &str, _f: &Filter) -> Result<ContentItem, StoreError> {
            std::future::pending().await
        }

        async fn insert(&self, _c: &str, _row: Row) -> Result<ContentItem, StoreError> {
            std::future::pending().await
        }

        async fn update(&self, _c: &str, _id: &str, _p: Row) -> Result<ContentItem, StoreError> {
            std::future::pending().await
        }

        async fn delete(&self, _c: &str, _id: &str) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    fn cache() -> SharedCache {
        Arc::new(MemoryCache::new(100, Duration::from_secs(60)))
    }

    async fn resolver() -> (VisibilityResolver, Arc<SqlxContentStore>) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = Arc::new(SqlxContentStore::new(pool));
        (
            VisibilityResolver::new(store.clone(), cache(), Duration::from_secs(1)),
            store,
        )
    }

    #[tokio::test]
    async fn test_missing_row_is_visible() {
        let (resolver, _) = resolver().await;
        assert!(resolver.is_visible("testimonials").await);
    }

    #[tokio::test]
    async fn test_stored_value_wins() {
        let (resolver, store) = resolver().await;
        let row = json!({"section_key": "blog", "is_visible": false});
        store
            .insert(VISIBILITY_COLLECTION, row.as_object().cloned().unwrap())
            .await
            .unwrap();

        assert!(!resolver.is_visible("blog").await);
        assert!(resolver.is_visible("skills").await);
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_open_without_caching() {
        let store = Arc::new(UnreachableStore {
            calls: AtomicUsize::new(0),
        });
        let resolver = VisibilityResolver::new(store.clone(), cache(), Duration::from_secs(1));

        assert!(resolver.is_visible("services").await);
        assert!(resolver.is_visible("services").await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_set_visibility_upserts_and_invalidates() {
        let (resolver, store) = resolver().await;
        assert!(resolver.is_visible("certifications").await);

        resolver.set_visibility("certifications", false).await.unwrap();
        assert!(!resolver.is_visible("certifications").await);

        resolver.set_visibility("certifications", true).await.unwrap();
        assert!(resolver.is_visible("certifications").await);

        let rows = store.fetch(&Query::new(VISIBILITY_COLLECTION)).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_set_visibility_times_out() {
        let resolver = VisibilityResolver::new(Arc::new(HangingStore), cache(), Duration::from_millis(20));
        let err = resolver.set_visibility("blog", false).await.unwrap_err();
        assert!(matches!(err, StoreError::Fetch(ref m) if m.contains("timed out")));
    }
}
