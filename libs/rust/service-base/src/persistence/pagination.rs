//! Page requests and paged results for list queries.

use serde::{Deserialize, Serialize};
use sqlx::{MySql, QueryBuilder};
use validator::Validate;

/// Largest page a single query may return.
pub const MAX_PAGE_SIZE: u64 = 500;

const fn default_current() -> u64 {
    1
}

const fn default_size() -> u64 {
    10
}

/// 1-based page selection, usually taken from the query string.
///
/// Sizes above [`MAX_PAGE_SIZE`] are capped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PageRequest {
    /// Page number starting at 1
    #[serde(default = "default_current")]
    #[validate(range(min = 1, message = "页码必须大于0"))]
    pub current: u64,
    /// Requested page size
    #[serde(default = "default_size")]
    #[validate(range(min = 1, message = "每页条数必须大于0"))]
    pub size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            current: default_current(),
            size: default_size(),
        }
    }
}

impl PageRequest {
    /// Select page `current` of `size` rows.
    #[must_use]
    pub const fn new(current: u64, size: u64) -> Self {
        Self { current, size }
    }

    /// Effective page size.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Number of rows skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.current.saturating_sub(1).saturating_mul(self.limit())
    }

    /// Append `LIMIT ? OFFSET ?` to a query.
    ///
    /// ```
    /// use service_base::persistence::PageRequest;
    /// use sqlx::{MySql, QueryBuilder};
    ///
    /// let mut query = QueryBuilder::<MySql>::new("SELECT id FROM users ORDER BY id");
    /// PageRequest::new(3, 20).apply(&mut query);
    /// assert_eq!(query.sql(), "SELECT id FROM users ORDER BY id LIMIT ? OFFSET ?");
    /// ```
    pub fn apply(&self, query: &mut QueryBuilder<'_, MySql>) {
        query.push(" LIMIT ");
        query.push_bind(self.limit());
        query.push(" OFFSET ");
        query.push_bind(self.offset());
    }
}

/// One page of results plus its position in the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows of this page
    pub records: Vec<T>,
    /// Total rows across all pages
    pub total: u64,
    /// Page number starting at 1
    pub current: u64,
    /// Page size
    pub size: u64,
    /// Number of pages
    pub pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page for `request`.
    #[must_use]
    pub fn new(records: Vec<T>, total: u64, request: &PageRequest) -> Self {
        let size = request.limit();
        Self {
            records,
            total,
            current: request.current.max(1),
            size,
            pages: total.div_ceil(size),
        }
    }

    /// Convert the records, keeping the page metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            records: self.records.into_iter().map(f).collect(),
            total: self.total,
            current: self.current,
            size: self.size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_query() {
        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::default());
        assert_eq!(request.offset(), 0);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn test_offset_and_cap() {
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
        let big = PageRequest::new(2, 10_000);
        assert_eq!(big.limit(), MAX_PAGE_SIZE);
        assert_eq!(big.offset(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_zero_page_is_invalid() {
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(1, 0).validate().is_err());
        assert!(PageRequest::new(1, 10).validate().is_ok());
    }

    #[test]
    fn test_apply_appends_window() {
        let mut query = QueryBuilder::<MySql>::new("SELECT * FROM orders");
        PageRequest::default().apply(&mut query);
        assert_eq!(query.sql(), "SELECT * FROM orders LIMIT ? OFFSET ?");
    }

    #[test]
    fn test_page_counts_and_map() {
        let page = Page::new(vec![1, 2, 3], 21, &PageRequest::new(2, 10));
        assert_eq!(page.pages, 3);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.records, vec![10, 20, 30]);
        assert_eq!(mapped.current, 2);
        assert_eq!(mapped.total, 21);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u8> = Page::new(Vec::new(), 0, &PageRequest::default());
        assert_eq!(page.pages, 0);
    }
}
