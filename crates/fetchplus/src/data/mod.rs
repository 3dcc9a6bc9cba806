//! Immutable data types for fetching.
//!
//! Requests, responses, the persisted cache entry layout, configuration and
//! lifecycle events. Nothing in this module performs I/O.

pub mod entry;
pub mod event;
pub mod headers;
pub mod options;
pub mod request;
pub mod response;

pub use entry::{CacheEntry, CachePolicySnapshot, CachedResponse, SNAPSHOT_VERSION};
pub use event::{AttemptContext, ErrorEvent, EventKind, FetchEvent, RequestEvent, ResponseEvent};
pub use headers::Headers;
pub use options::{ClientConfig, DEFAULT_RETRY_STATUS_CODES, RetryConfig};
pub use request::{Request, RequestInit};
pub use response::{Response, canonical_reason};
