//! Page-number pagination for list endpoints.
//!
//! Lists take a 1-based `page` and a `size`, and report the total row count and the
//! number of pages alongside the rows.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items per page.
pub const DEFAULT_SIZE: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_SIZE: i64 = 100;

/// Page parameters for list endpoints.
///
/// - `page`: 1-based page number (default: 1, values below 1 become 1)
/// - `size`: rows per page (default: 10, clamped to 1..=100)
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageParams {
    /// Page number, starting at 1 (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Rows per page (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub size: Option<i64>,
}

impl PageParams {
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[inline]
    pub fn size(&self) -> i64 {
        self.size.unwrap_or(DEFAULT_SIZE).clamp(1, MAX_SIZE)
    }

    /// Rows to skip before the requested page: `(page - 1) * size`.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.size())
    }
}

/// `ceil(total / size)`; zero rows is zero pages.
pub fn total_pages(total: i64, size: i64) -> i64 {
    if total <= 0 || size <= 0 {
        return 0;
    }
    (total + size - 1) / size
}

/// Paginated response wrapper for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    /// The rows of the requested page
    pub data: Vec<T>,
    /// Rows matching the query, ignoring pagination
    pub total_records: i64,
    pub total_pages: i64,
    pub page: i64,
    pub size: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_records: i64, page: i64, size: i64) -> Self {
        Self {
            data,
            total_records,
            total_pages: total_pages(total_records, size),
            page,
            size,
        }
    }
}
