//! Process-local cache with per-entry TTL.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use exchange_types::{Cache, CacheError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Configuration for [`MemoryCache`].
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Entry count above which expired entries are purged on insert.
    pub max_entries: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

/// Thread-safe string cache backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    config: MemoryCacheConfig,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Number of stored entries, including ones that expired but were not purged yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove_if(key, |_, e| !e.is_live(now));
            debug!(key, "cache entry expired");
        }
        None
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = self.lookup(key);
        match value {
            Some(_) => debug!(key, "cache hit"),
            None => debug!(key, "cache miss"),
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        if self.entries.len() >= self.config.max_entries {
            self.purge_expired();
        }

        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        debug!(key, ttl_secs = ttl.as_secs(), "cache set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache
            .set("rates:bcb:USD", "{\"value\":[]}", Duration::from_secs(60))
            .await
            .unwrap();

        let value = cache.get("rates:bcb:USD").await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"value\":[]}"));
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let cache = MemoryCache::new();
        assert!(cache.get("rates:bcb:EUR").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("k", "first", ttl).await.unwrap();
        cache.set("k", "second", ttl).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_expiry() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_millis(30)).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_purge_on_capacity() {
        let cache = MemoryCache::with_config(MemoryCacheConfig { max_entries: 2 });
        cache.set("a", "1", Duration::from_millis(10)).await.unwrap();
        cache.set("b", "2", Duration::from_millis(10)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.set("c", "3", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("c").await.unwrap().as_deref(), Some("3"));
    }
}
