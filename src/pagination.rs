//! Page-window arithmetic shared by every paginated listing.

/// Requests per page when browsing a subject's postings.
pub const REQUEST_PAGE_SIZE: usize = 5;
/// Accounts per page in the admin student listing.
pub const STUDENT_PAGE_SIZE: usize = 10;
/// Rows offered in the admin single-request delete picker.
pub const RECENT_REQUEST_LIMIT: usize = 10;
/// Hits returned by the admin student search.
pub const SEARCH_LIMIT: usize = 10;
/// Rows offered in the moderation enable/disable pickers.
pub const MODERATION_LIMIT: usize = 15;
/// Audit entries shown per review.
pub const AUDIT_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Computes the window for a zero-based `page_index`. `has_next` holds
/// exactly when `(page_index + 1) * page_size < items_total`. The index
/// arrives from decoded tokens, so the arithmetic saturates instead of
/// overflowing on a forged index; an out-of-range page is simply empty.
pub fn page(items_total: usize, page_index: usize, page_size: usize) -> PageWindow {
    PageWindow {
        offset: page_index.saturating_mul(page_size),
        has_prev: page_index > 0,
        has_next: page_index
            .saturating_add(1)
            .saturating_mul(page_size)
            < items_total,
    }
}
