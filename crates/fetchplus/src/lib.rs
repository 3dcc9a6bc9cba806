//! HTTP fetching with private response caching and retry with backoff.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable requests, responses, configuration and events
//! - [`core`] - Pure transformations: cache freshness rules and retry decisions
//! - `effects` - I/O behind traits: transport, cache stores and the fetch loop
//!
//! # Key Features
//!
//! - **Private Cache**: Responses are stored and served following HTTP
//!   caching semantics for a single-user cache (`Cache-Control`, `Expires`,
//!   `Vary`, heuristic freshness)
//! - **Pluggable Stores**: Any [`CacheStore`]; [`MemoryStore`] (Moka) and
//!   `SledStore` (on disk, feature `sled`) are provided
//! - **Retry With Backoff**: Transport failures and configured status codes
//!   are retried with exponential delays
//! - **Lifecycle Events**: Every attempt publishes `request`, then `response`
//!   or `error`, on an [`EventBus`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use fetchplus::{Client, EventKind, FetchEvent, MemoryStore, ReqwestClient, RetryConfig};
//!
//! # async fn run() -> fetchplus::Result<()> {
//! let client = Client::builder(ReqwestClient::new())
//!     .retry(RetryConfig::default().min_timeout(Duration::from_millis(200)))
//!     .cache(Arc::new(MemoryStore::new()))
//!     .build()?;
//!
//! client.events().on(EventKind::Response, |event| {
//!     if let FetchEvent::Response(r) = event {
//!         println!("{} {} in {:.1}ms", r.status_code, r.url, r.response_time_ms());
//!     }
//! });
//!
//! let response = client.fetch("https://example.com/").await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
mod effects;
mod error;

pub use crate::core::{CachePolicy, RetryScheduler, cache_key};
pub use crate::data::{
    CacheEntry, CachePolicySnapshot, CachedResponse, ClientConfig, ErrorEvent, EventKind,
    FetchEvent, Headers, Request, RequestEvent, RequestInit, Response, ResponseEvent, RetryConfig,
};
pub use crate::effects::{
    CacheManager, CacheStore, Client, ClientBuilder, EventBus, HttpClient, ListenerId, StoreResult,
};

#[cfg(feature = "moka")]
pub use crate::effects::MemoryStore;
#[cfg(feature = "reqwest")]
pub use crate::effects::{ReqwestClient, ReqwestError};
#[cfg(feature = "sled")]
pub use crate::effects::SledStore;

pub use crate::error::{BoxError, Error, Result, StoreError};
