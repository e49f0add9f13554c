use crate::runner::{RunnerRecord, RunnerStatus};

/// Filter criteria for the runners list.
///
/// Empty strings and `None` mean "no constraint"; they are left out of the
/// query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerFilters {
    pub status: Option<RunnerStatus>,
    pub category: String,
    pub search: String,
}

impl RunnerFilters {
    pub fn with_status(mut self, status: RunnerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.category.trim().is_empty()
            && self.search.trim().is_empty()
    }

    /// Non-empty criteria as `(key, value)` query pairs, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        let category = self.category.trim();
        if !category.is_empty() {
            pairs.push(("category", category.to_string()));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

/// Page window over the server-side runner collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index.
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Pagination {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            total_pages: 0,
        }
    }

    /// `ceil(total / limit)`; a zero limit yields zero pages.
    pub fn compute_total_pages(total: u64, limit: u32) -> u32 {
        if limit == 0 {
            return 0;
        }
        let pages = total.div_ceil(u64::from(limit));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Same window, new total.
    pub fn with_total(self, total: u64) -> Self {
        Self {
            total,
            total_pages: Self::compute_total_pages(total, self.limit),
            ..self
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 1-based index of the first and last row on the current page, clamped
    /// to the total. `None` when the page is past the end.
    pub fn visible_range(&self) -> Option<(u64, u64)> {
        let first =
            u64::from(self.page.saturating_sub(1)) * u64::from(self.limit) + 1;
        let last =
            (u64::from(self.page) * u64::from(self.limit)).min(self.total);
        (first <= last).then_some((first, last))
    }
}

/// One decoded page of the runners list endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerPage {
    pub records: Vec<RunnerRecord>,
    /// Number of runners matching the filters across all pages.
    pub total: u64,
}
