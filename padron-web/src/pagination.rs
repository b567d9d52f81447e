//! Pagination utilities for list endpoints (15 rows/page)

use serde::Serialize;

/// Page size constant for all pagination
pub const PAGE_SIZE: i64 = 15;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    #[serde(skip)]
    pub offset: i64,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]
///
/// # Examples
/// ```
/// use padron_web::pagination::calculate_pagination;
///
/// // 40 total results = 3 pages (15 + 15 + 10)
/// let p = calculate_pagination(40, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 15);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(40, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 30);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64) -> Pagination {
    let total_pages = (total_results + PAGE_SIZE - 1) / PAGE_SIZE;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        per_page: PAGE_SIZE,
        total: total_results,
        total_pages,
        offset,
    }
}

/// A page of rows plus its metadata
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}
