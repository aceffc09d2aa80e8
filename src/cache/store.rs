//! Timeline cache storage.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;

use crate::application::pagination::Page;
use crate::domain::entities::PostRecord;

use super::config::TimelineCacheConfig;
use super::lock::rw_write;

const SOURCE: &str = "cache::store";

struct CachedPage {
    page: Page<PostRecord>,
    inserted_at: Instant,
}

/// Time-bounded cache of paginated global-timeline pages.
///
/// Each key (page number) is either empty or holds a fully-built page with
/// its insertion timestamp. Pages are built outside the lock and published
/// whole, so readers never observe a torn page. Distinct page numbers are
/// independent entries with independent lifetimes.
pub struct TimelineCache {
    pages: RwLock<LruCache<u32, CachedPage>>,
    ttl: Duration,
}

impl TimelineCache {
    pub fn new(config: &TimelineCacheConfig) -> Self {
        Self {
            pages: RwLock::new(LruCache::new(config.page_limit_non_zero())),
            ttl: config.ttl(),
        }
    }

    /// Return the cached page if present and younger than the TTL.
    ///
    /// A stale entry is evicted and `None` returned; the caller recomputes
    /// and republishes via [`TimelineCache::insert`].
    pub fn get(&self, page_number: u32) -> Option<Page<PostRecord>> {
        self.get_at(page_number, Instant::now())
    }

    pub(crate) fn get_at(&self, page_number: u32, now: Instant) -> Option<Page<PostRecord>> {
        // LruCache::get mutates recency, so even reads take the write lock.
        let mut pages = rw_write(&self.pages, SOURCE, "get");
        match pages.get(&page_number) {
            Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => {
                counter!("rookery_timeline_cache_hit_total").increment(1);
                Some(entry.page.clone())
            }
            Some(_) => {
                pages.pop(&page_number);
                counter!("rookery_timeline_cache_expired_total").increment(1);
                counter!("rookery_timeline_cache_miss_total").increment(1);
                None
            }
            None => {
                counter!("rookery_timeline_cache_miss_total").increment(1);
                None
            }
        }
    }

    /// Publish a freshly-built page with a new timestamp.
    pub fn insert(&self, page_number: u32, page: Page<PostRecord>) {
        self.insert_at(page_number, page, Instant::now());
    }

    pub(crate) fn insert_at(&self, page_number: u32, page: Page<PostRecord>, now: Instant) {
        let mut pages = rw_write(&self.pages, SOURCE, "insert");
        pages.put(
            page_number,
            CachedPage {
                page,
                inserted_at: now,
            },
        );
    }

    /// Force every key to empty regardless of TTL. The only invalidation
    /// path besides expiry; exposed to operational callers.
    pub fn clear(&self) {
        rw_write(&self.pages, SOURCE, "clear").clear();
        counter!("rookery_timeline_cache_clear_total").increment(1);
    }

    pub fn len(&self) -> usize {
        rw_write(&self.pages, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use time::macros::datetime;

    use super::*;

    fn sample_page(marker: i64) -> Page<PostRecord> {
        Page {
            items: vec![PostRecord {
                id: marker,
                text: format!("post {marker}"),
                pub_date: datetime!(2024-06-01 12:00 UTC),
                author_id: 1,
                author_username: "ada".to_string(),
                group_id: None,
                group_slug: None,
                group_title: None,
                image: None,
            }],
            number: 1,
            total_count: 1,
            total_pages: 1,
            has_next: false,
            has_previous: false,
        }
    }

    #[test]
    fn fresh_entry_is_a_hit() {
        let cache = TimelineCache::new(&TimelineCacheConfig::default());
        let now = Instant::now();

        assert!(cache.get_at(1, now).is_none());

        cache.insert_at(1, sample_page(10), now);
        let hit = cache.get_at(1, now + Duration::from_secs(19)).expect("hit");
        assert_eq!(hit.items[0].id, 10);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = TimelineCache::new(&TimelineCacheConfig::default());
        let now = Instant::now();

        cache.insert_at(1, sample_page(10), now);
        assert!(cache.get_at(1, now + Duration::from_secs(20)).is_none());
        // The stale entry was evicted, not merely skipped.
        assert!(cache.is_empty());
    }

    #[test]
    fn pages_are_independent_entries() {
        let cache = TimelineCache::new(&TimelineCacheConfig::default());
        let now = Instant::now();

        cache.insert_at(1, sample_page(10), now);
        cache.insert_at(2, sample_page(20), now + Duration::from_secs(15));

        let later = now + Duration::from_secs(25);
        assert!(cache.get_at(1, later).is_none());
        assert_eq!(cache.get_at(2, later).expect("page 2 fresh").items[0].id, 20);
    }

    #[test]
    fn clear_empties_every_key() {
        let cache = TimelineCache::new(&TimelineCacheConfig::default());
        let now = Instant::now();

        cache.insert_at(1, sample_page(10), now);
        cache.insert_at(2, sample_page(20), now);
        cache.clear();

        assert!(cache.get_at(1, now).is_none());
        assert!(cache.get_at(2, now).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_evicts_least_recent_page() {
        let config = TimelineCacheConfig {
            page_limit: 2,
            ..Default::default()
        };
        let cache = TimelineCache::new(&config);
        let now = Instant::now();

        cache.insert_at(1, sample_page(10), now);
        cache.insert_at(2, sample_page(20), now);
        cache.insert_at(3, sample_page(30), now);

        assert!(cache.get_at(1, now).is_none());
        assert!(cache.get_at(2, now).is_some());
        assert!(cache.get_at(3, now).is_some());
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let cache = TimelineCache::new(&TimelineCacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.pages.write().expect("pages lock should be acquired");
            panic!("poison pages lock");
        }));

        cache.insert(1, sample_page(10));
        assert!(cache.get(1).is_some());
    }
}
