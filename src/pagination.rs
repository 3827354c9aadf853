//! Page bookkeeping for one list view. Pure state, no I/O.

use serde::{Deserialize, Serialize};

/// Display-ready description of the current page.
///
/// `range_start`/`range_end` are the 1-based, inclusive positions of the
/// rows on screen; both are 0 when the collection is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub range_start: u64,
    pub range_end: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    page_number: u32,
    page_size: u32,
    total_count: u64,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size: page_size.max(1),
            total_count: 0,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// `ceil(total_count / page_size)`, never less than 1.
    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Move to page `n`, clamped to `[1, total_pages]`.
    ///
    /// Returns `false` when the clamped page is the current one, so callers
    /// can skip the fetch.
    pub fn set_page(&mut self, n: u32) -> bool {
        let target = n.clamp(1, self.total_pages());
        if target == self.page_number {
            return false;
        }
        self.page_number = target;
        true
    }

    /// Change the page size. Always lands on page 1.
    pub fn set_page_size(&mut self, size: u32) -> bool {
        let size = size.max(1);
        let changed = size != self.page_size || self.page_number != 1;
        self.page_size = size;
        self.page_number = 1;
        changed
    }

    pub fn set_total_count(&mut self, total_count: u64) {
        self.total_count = total_count;
    }

    /// Adopt the page of an explicitly issued query without clamping; the
    /// server's count for that query is not known yet.
    pub(crate) fn follow(&mut self, page_number: u32, page_size: u32) {
        self.page_number = page_number.max(1);
        self.page_size = page_size.max(1);
    }

    pub fn describe(&self) -> PageSummary {
        let size = u64::from(self.page_size);
        let offset = u64::from(self.page_number - 1) * size;
        let (range_start, range_end) = if self.total_count == 0 || offset >= self.total_count {
            (0, 0)
        } else {
            (offset + 1, (offset + size).min(self.total_count))
        };

        PageSummary {
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages(),
            total_count: self.total_count,
            range_start,
            range_end,
        }
    }
}
