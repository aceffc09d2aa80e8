//! Page-number pagination over ordered timelines.
//!
//! Requests carry `?page=N`; anything absent or non-numeric means page 1, and
//! out-of-range numbers clamp to the nearest valid page so stale links keep
//! resolving instead of erroring.

use serde::Serialize;

/// Default page size for every timeline in the system.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A bounded slice of a timeline plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_count: usize,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Slice `items` into the requested page.
///
/// `page_size` below 1 is clamped to 1. Page 1 always exists, possibly empty.
/// Concatenating pages 1..=total_pages reproduces `items` exactly.
pub fn paginate<T>(items: Vec<T>, page_size: u32, requested: u32) -> Page<T> {
    let page_size = page_size.max(1);
    let total_count = items.len();
    let total_pages = total_pages_for(total_count, page_size);
    let number = requested.clamp(1, total_pages);

    let start = ((number - 1) as usize).saturating_mul(page_size as usize);
    let end = start.saturating_add(page_size as usize).min(total_count);
    let page_items: Vec<T> = if start >= total_count {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(end - start).collect()
    };

    Page {
        items: page_items,
        number,
        total_count,
        total_pages,
        has_next: number < total_pages,
        has_previous: number > 1,
    }
}

/// Page count is at least 1 so that an empty timeline still has a page 1.
fn total_pages_for(total_count: usize, page_size: u32) -> u32 {
    let pages = total_count.div_ceil(page_size as usize);
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Parse a raw `?page=` value; absent or non-numeric means page 1.
pub fn parse_page_param(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}
