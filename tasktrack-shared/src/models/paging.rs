/// Pagination and sort normalization shared by the list queries
///
/// Client-supplied paging parameters are never trusted: pages and limits
/// below 1 fall back to the defaults, and unrecognized sort directions fall
/// back to ascending instead of erroring.

/// Default page number when none (or an invalid one) is supplied
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size when none (or an invalid one) is supplied
pub const DEFAULT_LIMIT: i64 = 10;

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses "ASC"/"DESC" (case-insensitive); anything else falls back to
    /// ascending
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()) {
            Some(ref v) if v == "DESC" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Normalized page/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamps page and limit to at least 1, applying defaults when absent
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p,
            _ => DEFAULT_PAGE,
        };
        let limit = match limit {
            Some(l) if l >= 1 => l,
            _ => DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    /// Row offset for the current page
    ///
    /// Saturates instead of overflowing so an absurdly large page number
    /// yields an offset past every row rather than a panic or a negative
    /// OFFSET.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::new(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_request_clamps_non_positive() {
        let page = PageRequest::new(Some(0), Some(-5));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
    }

    #[test]
    fn test_page_request_offset() {
        let page = PageRequest::new(Some(3), Some(25));
        assert_eq!(page.offset(), 50);
    }

    #[test]
    fn test_page_request_offset_saturates_on_huge_page() {
        let page = PageRequest::new(Some(i64::MAX), Some(10));
        assert_eq!(page.offset(), i64::MAX);

        let page = PageRequest::new(Some(i64::MAX), Some(i64::MAX));
        assert_eq!(page.offset(), i64::MAX);
    }

    #[test]
    fn test_sort_order_from_param() {
        assert_eq!(SortOrder::from_param(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(None), SortOrder::Asc);
    }

    #[test]
    fn test_sort_order_as_sql() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }
}
