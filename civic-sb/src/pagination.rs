//! Pagination utilities
//!
//! Pages are 1-indexed. Unlike a browsing UI, a page past the end yields an
//! empty page rather than being clamped back to the last one, so walking
//! pages 1..=n visits every row exactly once.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page size a caller may request
pub const MAX_LIMIT: i64 = 100;

/// Query parameters accepted by every paginated endpoint
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// Sanitized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page
    pub limit: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

impl Pagination {
    /// Clamp a raw request: page >= 1, limit in 1..=MAX_LIMIT
    pub fn new(page: i64, limit: i64) -> Self {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_LIMIT);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        Pagination::new(query.page, query.limit)
    }
}

/// One page of results plus totals
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: (total + pagination.limit - 1) / pagination.limit,
        }
    }

    /// Convert every item, keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}
