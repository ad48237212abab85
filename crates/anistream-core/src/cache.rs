//! Short-lived in-memory response cache
//!
//! Entries expire a fixed time after insertion; a refresh overwrites the old
//! entry. There is no size-based eviction.

use std::future::Future;
use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use crate::error::Result;
use crate::types::{EpisodeDetails, EpisodeServer, SearchResult};

/// TTL cache from a request key to a cloned response value
pub struct ResponseCache<V> {
    inner: Cache<String, V>,
}

impl<V> ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.inner.insert(key.into(), value);
    }

    /// Returns the cached value or runs `fetch` and caches its success
    ///
    /// Errors are returned as-is and never cached.
    pub async fn get_or_try_fetch<F, Fut>(&self, key: String, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(hit) = self.inner.get(&key) {
            debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.inner.insert(key, value.clone());
        Ok(value)
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks();
    }

    /// Number of live entries
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The three caches every provider keeps
pub struct ProviderCaches {
    pub search: ResponseCache<Vec<SearchResult>>,
    pub episodes: ResponseCache<Vec<EpisodeDetails>>,
    pub servers: ResponseCache<EpisodeServer>,
}

impl ProviderCaches {
    pub fn new(ttl: Duration) -> Self {
        Self {
            search: ResponseCache::new(ttl),
            episodes: ResponseCache::new(ttl),
            servers: ResponseCache::new(ttl),
        }
    }

    pub fn len(&self) -> u64 {
        self.search.len() + self.episodes.len() + self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.search.clear();
        self.episodes.clear();
        self.servers.clear();
    }
}
