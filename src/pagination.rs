//! This module defines the common functionality for paging data.

use serde::Serialize;

/// The page number used when a request does not specify one.
pub const DEFAULT_PAGE: i64 = 1;
/// The page size used when a request does not specify one.
pub const DEFAULT_LIMIT: i64 = 10;

/// A validated page request.
///
/// Both fields are clamped to at least one, so `offset` cannot underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of rows per page.
    pub limit: u64,
}

impl PageQuery {
    /// Build a page request from optional query parameters, applying
    /// defaults and clamping both values to at least one.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1) as u64,
            limit: limit.unwrap_or(DEFAULT_LIMIT).max(1) as u64,
        }
    }

    /// The number of rows to skip before the requested page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata derived from a page request and the total number of
/// matching rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// The total number of rows matching the query, across all pages.
    pub total: u64,
    /// The 1-based page number that was returned.
    pub page: u64,
    /// The maximum number of rows per page.
    pub limit: u64,
    /// The total number of pages.
    pub total_pages: u64,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_previous_page: bool,
}

impl PageInfo {
    /// Derive the pagination block for `query` given the total number of
    /// matching rows.
    pub fn new(query: PageQuery, total: u64) -> Self {
        let total_pages = total.div_ceil(query.limit);

        Self {
            total,
            page: query.page,
            limit: query.limit,
            total_pages,
            has_next_page: query.page < total_pages,
            has_previous_page: query.page > 1,
        }
    }
}
