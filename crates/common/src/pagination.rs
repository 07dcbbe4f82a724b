//! Pagination utilities shared by services and repositories.
//!
//! Callers hand in raw, possibly absent or out-of-range page parameters;
//! `PageWindow::clamp` turns them into a 1-based window that repositories
//! can translate into offset/limit, and `PagedResult` is the envelope
//! returned to callers.

use serde::{Deserialize, Serialize};

/// Bounds applied when normalising caller-supplied page parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    /// page size used when the caller does not ask for one
    pub default_page_size: u64,
    /// upper bound for any requested page size
    pub max_page_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self { Self { default_page_size: 50, max_page_size: 200 } }
}

/// A normalised, 1-based page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// 1-based page index
    pub page: u64,
    /// items per page, always >= 1
    pub page_size: u64,
}

impl PageWindow {
    /// Clamp raw page parameters into a valid window.
    ///
    /// `page_size` falls back to `limits.default_page_size` and is clamped into
    /// `[1, limits.max_page_size]`; `page` falls back to 1 and is raised to at least 1.
    pub fn clamp(page: Option<i64>, page_size: Option<i64>, limits: PageLimits) -> Self {
        let max = i64::try_from(limits.max_page_size.max(1)).unwrap_or(i64::MAX);
        let default = i64::try_from(limits.default_page_size).unwrap_or(max);
        let page_size = page_size.unwrap_or(default).clamp(1, max);
        let page = page.unwrap_or(1).max(1);
        // both values are >= 1 here, so the conversions cannot fail
        Self {
            page: u64::try_from(page).unwrap_or(1),
            page_size: u64::try_from(page_size).unwrap_or(1),
        }
    }

    /// Number of rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// `ceil(total_count / page_size)`
    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(self.page_size.max(1))
    }
}

impl Default for PageWindow {
    fn default() -> Self { Self { page: 1, page_size: PageLimits::default().default_page_size } }
}

/// One page of items plus the counters callers need to navigate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, window: PageWindow) -> Self {
        Self {
            items,
            total_count,
            page: window.page,
            page_size: window.page_size,
            total_pages: window.total_pages(total_count),
        }
    }

    pub fn has_next_page(&self) -> bool { self.page < self.total_pages }

    pub fn has_previous_page(&self) -> bool { self.page > 1 }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}
