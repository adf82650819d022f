//! Catalog response cache using moka
//!
//! Wraps any `CatalogClient` and memoizes successful searches by
//! `(kind, params)`. Failures pass through uncached so a transient outage is
//! retried on the next request.

use crate::client::{CatalogClient, SearchKind, SearchParams};
use crate::error::CatalogError;
use async_trait::async_trait;
use cmr_core::{CacheConfig, Item};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

type CacheKey = (SearchKind, SearchParams);

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Caching decorator over a catalog client
#[derive(Clone)]
pub struct CachedCatalogClient {
    inner: Arc<dyn CatalogClient>,
    cache: Cache<CacheKey, Arc<Vec<Item>>>,
}

impl CachedCatalogClient {
    /// Create cache with max capacity and entry lifetime
    #[must_use]
    pub fn new(inner: Arc<dyn CatalogClient>, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Create cache from configuration
    #[inline]
    #[must_use]
    pub fn from_config(inner: Arc<dyn CatalogClient>, config: &CacheConfig) -> Self {
        Self::new(inner, config.max_entries, config.ttl())
    }

    /// Drop every cached response
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        CacheStats {
            entry_count: self.cache.entry_count(),
        }
    }
}

impl std::fmt::Debug for CachedCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCatalogClient")
            .field("entry_count", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogClient for CachedCatalogClient {
    async fn search(
        &self,
        kind: SearchKind,
        params: &SearchParams,
    ) -> Result<Vec<Item>, CatalogError> {
        let key = (kind, params.clone());
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!(%kind, keyword = %params.keyword, "catalog cache hit");
            return Ok(hit.as_ref().clone());
        }

        let items = self.inner.search(kind, params).await?;
        self.cache.insert(key, Arc::new(items.clone())).await;
        Ok(items)
    }
}
