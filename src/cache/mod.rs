//! Timeline cache.
//!
//! A time-bounded cache of the paginated global timeline, keyed by page
//! number. Writes do NOT invalidate it: a page stays served until its TTL
//! elapses or an operator calls [`TimelineCache::clear`]. That staleness
//! window (default 20 seconds) is a deliberate tradeoff, not a bug.
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 20
//! page_limit = 64
//! ```

mod config;
pub(crate) mod lock;
mod store;

pub use config::TimelineCacheConfig;
pub use store::TimelineCache;
