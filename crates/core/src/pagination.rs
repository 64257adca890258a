//! Pagination summary shared by both list modes.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Position within a paginated result.
///
/// When computed locally, `total_pages == max(1, ceil(total_records /
/// page_size))`. Server-mode values are taken from the backend as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub page_size: u32,
    pub total_records: u64,
    pub total_pages: u32,
}

impl PaginationInfo {
    /// Compute pagination for `total_records` rows.
    pub fn compute(current_page: u32, page_size: u32, total_records: u64) -> Self {
        Self {
            current_page: current_page.max(1),
            page_size,
            total_records,
            total_pages: total_pages(total_records, page_size),
        }
    }

    /// Page 1 of 1 with no records. Used after a failed fetch.
    pub fn reset(page_size: u32) -> Self {
        Self::compute(1, page_size, 0)
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// `max(1, ceil(total_records / page_size))`. A zero page size counts as a
/// single page.
pub fn total_pages(total_records: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = total_records.div_ceil(u64::from(page_size)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Index range of `page` (1-based) within a list of `len` items, clamped to
/// the list. Pages past the end give an empty range.
pub fn page_bounds(page: u32, page_size: u32, len: usize) -> Range<usize> {
    let size = page_size as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(size).min(len);
    let end = start.saturating_add(size).min(len);
    start..end
}
