//! Shared pagination parameters for list operations.
//!
//! List operations take 1-based `page` + `limit` parameters. The `limit` is
//! clamped to keep queries bounded, and responses always carry a total count
//! so callers can page.

use serde::{Deserialize, Serialize};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination parameters for list operations.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Pagination {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Get the page number, defaulting to 1 and never below it.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the limit value, clamped between 1 and [`MAX_LIMIT`].
    /// Defaults to [`DEFAULT_LIMIT`] if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Number of rows to skip for the requested page.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let p = Pagination::new(0, 0);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 1);

        let p = Pagination::new(-3, 100_000);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_LIMIT);
    }

    #[test]
    fn test_offset() {
        let p = Pagination::new(3, 25);
        assert_eq!(p.offset(), 50);
    }
}
