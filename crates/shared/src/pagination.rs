//! Page/limit pagination.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Query parameters for a paginated listing. Missing or zero values fall back
/// to defaults; `limit` is clamped to [`MAX_LIMIT`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        match self.page {
            Some(p) if p > 0 => p,
            _ => DEFAULT_PAGE,
        }
    }

    pub fn limit(&self) -> u32 {
        match self.limit {
            Some(l) if l > 0 => l.min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        }
    }

    /// Row offset for SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

/// Pagination block returned alongside a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let page = query.page();
        let limit = query.limit();
        let total = total.max(0);
        let total_pages = ((total as u64).div_ceil(u64::from(limit))) as u32;

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// One page of items with its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 10);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_zero_values_fall_back() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(q.page(), DEFAULT_PAGE);
        assert_eq!(q.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_limit_is_clamped() {
        let q = PageQuery {
            page: Some(2),
            limit: Some(1000),
        };
        assert_eq!(q.limit(), MAX_LIMIT);
        assert_eq!(q.offset(), 100);
    }

    #[test]
    fn test_meta_pages() {
        let q = PageQuery {
            page: Some(2),
            limit: Some(2),
        };
        let meta = PageMeta::new(&q, 5);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn test_meta_empty() {
        let meta = PageMeta::new(&PageQuery::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = PageMeta::new(&PageQuery::default(), 12);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["hasNextPage"], true);
    }
}
