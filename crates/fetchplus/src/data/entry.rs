//! Serializable cache entry layout.
//!
//! Entries are written by [`CacheManager`](crate::CacheManager) and read back
//! by any process sharing the same store, so every field here is part of the
//! persisted format. Bump [`SNAPSHOT_VERSION`] when the layout changes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::headers::Headers;
use super::response::Response;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted form of a [`CachePolicy`](crate::CachePolicy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicySnapshot {
    pub version: u32,
    /// When the response was received, in milliseconds since the Unix epoch.
    pub response_time_ms: i64,
    pub status: u16,
    pub method: String,
    pub url: String,
    pub host: Option<String>,
    pub request_cache_control: Option<String>,
    /// Request headers named by the response's `Vary`.
    pub vary_request_headers: Headers,
    pub response_headers: Headers,
}

/// Persisted form of a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl From<&Response> for CachedResponse {
    fn from(response: &Response) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: response.body.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub policy: CachePolicySnapshot,
    pub response: CachedResponse,
}
