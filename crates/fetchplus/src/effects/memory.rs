//! In-memory [`CacheStore`] backed by Moka.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache as MokaCache;
use tracing::debug;

use super::store::{CacheStore, StoreResult};
use crate::data::CacheEntry;

#[derive(Clone)]
struct StoredEntry {
    entry: CacheEntry,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, StoredEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local store; clones share the same entries.
#[derive(Clone)]
pub struct MemoryStore {
    cache: MokaCache<String, StoredEntry>,
}

impl MemoryStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self {
            cache: MokaCache::builder().expire_after(PerEntryTtl).build(),
        }
    }

    /// Store holding at most `max_entries`; the least useful entries are
    /// evicted first.
    pub fn with_capacity(max_entries: u64) -> Self {
        debug!(max_entries, "Memory cache store created");
        Self {
            cache: MokaCache::builder()
                .max_capacity(max_entries)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Approximate number of live entries.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        Ok(self.cache.get(key).await.map(|stored| stored.entry))
    }

    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> StoreResult<()> {
        self.cache
            .insert(key.to_owned(), StoredEntry { entry, ttl })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CachePolicy;
    use crate::data::{CachedResponse, Request, Response};

    fn entry(body: &'static str) -> CacheEntry {
        let request = Request::get("http://test.com/");
        let response = Response::new(200, "http://test.com/")
            .header("cache-control", "max-age=60")
            .body(body);
        CacheEntry {
            policy: CachePolicy::new(&request, &response).to_snapshot(),
            response: CachedResponse::from(&response),
        }
    }

    #[tokio::test]
    async fn get_missing_key() {
        let store = MemoryStore::new();
        assert!(store.get("fetchplus:nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store
            .set("fetchplus:a", entry("hello"), Duration::from_secs(60))
            .await
            .unwrap();

        let loaded = store.get("fetchplus:a").await.unwrap().unwrap();
        assert_eq!(loaded.response.body, "hello");
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = MemoryStore::new();
        store.set("k", entry("first"), Duration::from_secs(60)).await.unwrap();
        store.set("k", entry("second"), Duration::from_secs(60)).await.unwrap();

        let loaded = store.get("k").await.unwrap().unwrap();
        assert_eq!(loaded.response.body, "second");
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let store = MemoryStore::new();
        store.set("short", entry("x"), Duration::from_millis(50)).await.unwrap();
        store.set("long", entry("y"), Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(store.get("short").await.unwrap().is_none());
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", entry("shared"), Duration::from_secs(60)).await.unwrap();

        assert!(other.get("k").await.unwrap().is_some());
    }
}
