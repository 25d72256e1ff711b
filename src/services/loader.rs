//! Section content loader
//!
//! Fetches a section's rows, memoises the raw list, applies the section's
//! ordering and degrades to a fallback (or nothing) when the store fails.
//! Callers never see an error from here.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use super::sections::SectionSpec;
use crate::cache::{content_key, CacheLayer, SharedCache};
use crate::models::{ContentItem, Notice};
use crate::store::{DynContentStore, Filter, Query, StoreError};

/// Outcome of loading one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionContent {
    pub items: Vec<ContentItem>,
    pub used_fallback: bool,
    /// Set when the store failed; shown to the visitor as a toast
    pub failure: Option<Notice>,
}

/// Outcome of loading a singleton row (hero, author profile)
#[derive(Debug, Clone, PartialEq)]
pub struct SingletonContent {
    pub item: Option<ContentItem>,
    pub failure: Option<Notice>,
}

pub struct SectionLoader {
    store: DynContentStore,
    cache: SharedCache,
    timeout: Duration,
}

/// Run a store call under the per-request timeout
pub(crate) async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Fetch(format!(
            "request timed out after {}s",
            timeout.as_secs_f32()
        ))),
    }
}

impl SectionLoader {
    pub fn new(store: DynContentStore, cache: SharedCache, timeout: Duration) -> Self {
        Self {
            store,
            cache,
            timeout,
        }
    }

    /// The read issued for a section
    pub fn query_for(spec: &SectionSpec) -> Query {
        let mut query = Query::new(spec.collection);
        if spec.visibility_column {
            query = query.where_eq("is_visible", true);
        }
        if let Some(hint) = spec.ordering.order_hint() {
            query = query.order_by(hint);
        }
        query
    }

    pub async fn load(&self, spec: &SectionSpec) -> SectionContent {
        let query = Self::query_for(spec);

        let failure = match self.fetch_cached(&query).await {
            Ok(mut items) => {
                if spec.visibility_column {
                    items.retain(|item| item.is_visible);
                }
                if !items.is_empty() {
                    return SectionContent {
                        items: spec.ordering.apply(items),
                        used_fallback: false,
                        failure: None,
                    };
                }
                None
            }
            Err(e) => {
                tracing::warn!(section = %spec.key, error = %e, "Section failed to load");
                Some(Notice::load_failed(spec.key.as_str()))
            }
        };

        match spec.fallback {
            Some(fallback) => SectionContent {
                items: spec.ordering.apply(fallback()),
                used_fallback: true,
                failure,
            },
            None => SectionContent {
                items: Vec::new(),
                used_fallback: false,
                failure,
            },
        }
    }

    /// Load the single row of `collection`; a missing row is not a failure
    pub async fn load_singleton(&self, collection: &str, label: &str) -> SingletonContent {
        let key = content_key(collection, "single");

        match self.cache.get::<Option<ContentItem>>(&key).await {
            Ok(Some(item)) => {
                tracing::debug!("Cache hit: {}", key);
                return SingletonContent { item, failure: None };
            }
            Ok(None) => tracing::debug!("Cache miss: {}", key),
            Err(e) => tracing::warn!("Discarding unreadable cache entry {}: {}", key, e),
        }

        let result = with_timeout(
            self.timeout,
            self.store.fetch_single(collection, &Filter::new()),
        )
        .await;

        let item = match result {
            Ok(item) => Some(item),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::warn!(section = %label, error = %e, "Singleton failed to load");
                return SingletonContent {
                    item: None,
                    failure: Some(Notice::load_failed(label)),
                };
            }
        };

        if let Err(e) = self.cache.set(&key, &item, self.cache.default_ttl()).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        SingletonContent { item, failure: None }
    }

    async fn fetch_cached(&self, query: &Query) -> Result<Vec<ContentItem>, StoreError> {
        let key = content_key(&query.collection, &query.cache_key());

        match self.cache.get::<Vec<ContentItem>>(&key).await {
            Ok(Some(items)) => {
                tracing::debug!("Cache hit: {}", key);
                return Ok(items);
            }
            Ok(None) => tracing::debug!("Cache miss: {}", key),
            Err(e) => tracing::warn!("Discarding unreadable cache entry {}: {}", key, e),
        }

        let items = with_timeout(self.timeout, self.store.fetch(query)).await?;
        if let Err(e) = self.cache.set(&key, &items, self.cache.default_ttl()).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        Ok(items)
    }
}
