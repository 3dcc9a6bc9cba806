use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::data::CacheEntry;
use crate::error::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key/value storage for cache entries.
///
/// Implementations must be safe for concurrent `get`/`set` from many tasks;
/// callers add no locking of their own. Concurrent writes to the same key
/// may race, and the last write is allowed to win.
///
/// Expiry is the store's job: an entry written with `ttl` must not be
/// returned by `get` once `ttl` has elapsed. Returning it anyway is not
/// unsafe (freshness is checked again on read), only wasteful.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the entry stored under `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<CacheEntry>>;

    /// Store `entry` under `key`, replacing any previous entry, for `ttl`.
    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> StoreResult<()>;
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn get(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> StoreResult<()> {
        (**self).set(key, entry, ttl).await
    }
}
