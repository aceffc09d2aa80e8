//! Timeline cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TTL_SECONDS: u64 = 20;
const DEFAULT_PAGE_LIMIT: usize = 64;

/// Cache configuration from `rookery.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimelineCacheConfig {
    /// Enable the global-timeline cache.
    pub enabled: bool,
    /// Maximum age of a cached page before it is recomputed.
    pub ttl_seconds: u64,
    /// Maximum distinct page numbers kept (LRU beyond this).
    pub page_limit: usize,
}

impl Default for TimelineCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl TimelineCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Returns the page limit as NonZeroUsize, clamping to 1 if zero.
    pub fn page_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
