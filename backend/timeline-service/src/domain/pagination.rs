//! Shared pagination utility.
//!
//! All raw `limit`/`offset`/`page` parsing happens here so both builders
//! behave the same way. Parsing is permissive: anything absent, empty or not
//! a non-negative integer falls back to the default instead of being
//! rejected. A zero `limit` or `page` also falls back, since neither can
//! produce a meaningful page.

use serde::Serialize;
use std::str::FromStr;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_OFFSET: u64 = 0;
pub const DEFAULT_PAGE: u32 = 1;

/// Offset-based window (feed, followers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

/// Page-number request (activity timeline), `page` is 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)).saturating_mul(u64::from(self.limit))
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

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|s| s.trim().parse::<T>().ok()).unwrap_or(default)
}

fn parse_positive_or(raw: Option<&str>, default: u32) -> u32 {
    match parse_or(raw, default) {
        0 => default,
        n => n,
    }
}

/// `(limitRaw, offsetRaw) -> (limit, offset)`
pub fn normalize_window(limit_raw: Option<&str>, offset_raw: Option<&str>) -> PageWindow {
    PageWindow {
        limit: parse_positive_or(limit_raw, DEFAULT_LIMIT),
        offset: parse_or(offset_raw, DEFAULT_OFFSET),
    }
}

/// `(pageRaw, limitRaw) -> (page, limit)`
pub fn normalize_page(page_raw: Option<&str>, limit_raw: Option<&str>) -> PageRequest {
    PageRequest {
        page: parse_positive_or(page_raw, DEFAULT_PAGE),
        limit: parse_positive_or(limit_raw, DEFAULT_LIMIT),
    }
}

/// Pagination block for offset-paged responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPagination {
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
    pub has_more: bool,
    pub next_offset: Option<u64>,
}

impl OffsetPagination {
    pub fn new(window: PageWindow, page_len: usize, total: u64) -> Self {
        let seen = window.offset.saturating_add(page_len as u64);
        let has_more = seen < total;
        Self {
            total,
            limit: window.limit,
            offset: window.offset,
            has_more,
            next_offset: has_more.then(|| window.offset.saturating_add(u64::from(window.limit))),
        }
    }

    pub fn empty(window: PageWindow) -> Self {
        Self::new(window, 0, 0)
    }
}

/// Pagination block for page-numbered responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PagePagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(request.limit.max(1)));
        Self {
            total,
            page: request.page,
            limit: request.limit,
            total_pages,
            has_next_page: u64::from(request.page) < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults() {
        assert_eq!(normalize_window(None, None), PageWindow::default());
        assert_eq!(
            normalize_window(Some("abc"), Some("")),
            PageWindow {
                limit: 10,
                offset: 0
            }
        );
        assert_eq!(normalize_window(Some("0"), Some("0")).limit, 10);
        assert_eq!(normalize_window(Some("-5"), Some("-1")), PageWindow::default());
        assert_eq!(normalize_window(Some("2.5"), None).limit, 10);
    }

    #[test]
    fn test_window_parses_values() {
        assert_eq!(
            normalize_window(Some(" 25 "), Some("40")),
            PageWindow {
                limit: 25,
                offset: 40
            }
        );
    }

    #[test]
    fn test_page_request_offset() {
        let req = normalize_page(Some("3"), Some("20"));
        assert_eq!(req.offset(), 40);
        assert_eq!(normalize_page(Some("0"), None).page, 1);
        assert_eq!(normalize_page(None, None).offset(), 0);
    }

    #[test]
    fn test_offset_pagination_has_more() {
        let window = PageWindow {
            limit: 3,
            offset: 0,
        };
        let p = OffsetPagination::new(window, 3, 5);
        assert!(p.has_more);
        assert_eq!(p.next_offset, Some(3));

        let last = OffsetPagination::new(
            PageWindow {
                limit: 3,
                offset: 3,
            },
            2,
            5,
        );
        assert!(!last.has_more);
        assert_eq!(last.next_offset, None);
    }

    #[test]
    fn test_offset_past_end() {
        let p = OffsetPagination::new(
            PageWindow {
                limit: 10,
                offset: 50,
            },
            0,
            5,
        );
        assert!(!p.has_more);
        assert_eq!(p.next_offset, None);
    }

    #[test]
    fn test_page_pagination() {
        let p = PagePagination::new(PageRequest { page: 1, limit: 10 }, 3);
        assert_eq!(p.total_pages, 1);
        assert!(!p.has_next_page);
        assert!(!p.has_prev_page);

        let p = PagePagination::new(PageRequest { page: 2, limit: 10 }, 21);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);

        let empty = PagePagination::new(PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn test_pagination_json_shape() {
        let value = serde_json::to_value(OffsetPagination::empty(PageWindow::default())).unwrap();
        assert_eq!(value["hasMore"], false);
        assert!(value["nextOffset"].is_null());
        assert_eq!(value["limit"], 10);
    }
}
