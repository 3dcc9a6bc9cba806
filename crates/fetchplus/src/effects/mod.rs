//! I/O at the edge: transport, cache stores, event delivery and the fetch loop.
//!
//! Every side effect sits behind a trait ([`HttpClient`], [`CacheStore`]) so
//! the orchestration in [`Client`] can be driven by mocks in tests.

mod cache;
mod client;
mod events;
mod http;
#[cfg(feature = "moka")]
mod memory;
#[cfg(feature = "sled")]
mod sled_store;
mod store;

pub use cache::CacheManager;
pub use client::{Client, ClientBuilder};
pub use events::{EventBus, ListenerId};
pub use http::HttpClient;
#[cfg(feature = "reqwest")]
pub use http::{ReqwestClient, ReqwestError};
#[cfg(feature = "moka")]
pub use memory::MemoryStore;
#[cfg(feature = "sled")]
pub use sled_store::SledStore;
pub use store::{CacheStore, StoreResult};
