//! Key/value cache port.

use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheError;

/// A string key/value store with per-entry TTL.
///
/// Shared by every provider and by the conversion service; implementations
/// must be safe for concurrent use. `set` is last-writer-wins.
#[async_trait::async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Returns the stored value, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

#[async_trait::async_trait]
impl<C: Cache + ?Sized> Cache for Arc<C> {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        (**self).set(key, value, ttl).await
    }
}
