//! Pure transformations: cache policy evaluation and retry decisions.
//!
//! Nothing here performs I/O. Time-dependent functions have `*_at`
//! variants that take the current time as an argument.

pub mod cache_control;
pub mod date;
mod key;
pub mod policy;
pub mod retry;

pub use cache_control::{CacheControl, MaxStale};
pub use key::{CACHE_KEY_PREFIX, cache_key};
pub use policy::CachePolicy;
pub use retry::{Failure, Outcome, RetryScheduler};
