//! Response cache on top of a [`CacheStore`].
//!
//! Freshness decisions come from [`CachePolicy`]; this module only moves
//! entries in and out of the store.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::store::CacheStore;
use crate::core::{CachePolicy, cache_key};
use crate::data::{CacheEntry, CachedResponse, Request, Response};
use crate::error::Result;

/// Reads and writes cached responses keyed by URL.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Return a cached response usable for `request` without revalidation.
    ///
    /// A stale entry or one whose `Vary` headers do not match is a miss.
    pub async fn get(&self, request: &Request) -> Result<Option<Response>> {
        let key = cache_key(&request.url);
        let Some(entry) = self.store.get(&key).await? else {
            trace!(%key, "Cache miss");
            return Ok(None);
        };

        let policy = CachePolicy::from_snapshot(entry.policy)?;
        if !policy.satisfies_without_revalidation(request) {
            debug!(%key, stale = policy.is_stale(), "Cached entry not usable for request");
            return Ok(None);
        }

        debug!(%key, status = entry.response.status, "Cache hit");
        let CachedResponse {
            url,
            status,
            status_text,
            body,
            ..
        } = entry.response;
        Ok(Some(Response {
            status,
            status_text,
            headers: policy.response_headers(),
            body,
            url,
        }))
    }

    /// Store `response` if its policy allows it. Returns whether it was stored.
    pub async fn set(&self, request: &Request, response: &Response) -> Result<bool> {
        let policy = CachePolicy::new(request, response);
        if !policy.storable() {
            trace!(url = %request.url, status = response.status, "Response not storable");
            return Ok(false);
        }

        let ttl = policy.time_to_live();
        if ttl.is_zero() {
            trace!(url = %request.url, "Response already stale, not storing");
            return Ok(false);
        }

        let key = cache_key(&request.url);
        let entry = CacheEntry {
            policy: policy.to_snapshot(),
            response: CachedResponse::from(response),
        };
        self.store.set(&key, entry, ttl).await?;
        debug!(%key, ttl_ms = ttl.as_millis() as u64, "Stored response in cache");
        Ok(true)
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager").finish_non_exhaustive()
    }
}
