use std::ops::Range;

use serde::Deserialize;

/// Books per listing page. Not configurable through the API.
pub const BOOKS_PER_SHELF: usize = 8;

/// `?page=N` query string.
///
/// Kept as text so a malformed value falls back to the first page instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// 1-based page number; defaults to 1
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// Index range of `page` within `len` items. Pages below 1 or past the end
/// are empty.
pub fn page_window(page: i64, per_page: usize, len: usize) -> Range<usize> {
    let Some(index) = page.checked_sub(1).and_then(|i| usize::try_from(i).ok()) else {
        return 0..0;
    };
    let start = index.saturating_mul(per_page).min(len);
    let end = start.saturating_add(per_page).min(len);
    start..end
}

pub fn paginate<T>(items: &[T], page: i64) -> &[T] {
    &items[page_window(page, BOOKS_PER_SHELF, items.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: Option<&str>) -> PageQuery {
        PageQuery {
            page: raw.map(str::to_string),
        }
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(query(None).page(), 1);
        assert_eq!(query(Some("abc")).page(), 1);
        assert_eq!(query(Some("3")).page(), 3);
    }

    #[test]
    fn windows_follow_fixed_page_size() {
        assert_eq!(page_window(1, 8, 20), 0..8);
        assert_eq!(page_window(2, 8, 20), 8..16);
        assert_eq!(page_window(3, 8, 20), 16..20);
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        assert!(page_window(4, 8, 20).is_empty());
        assert!(page_window(0, 8, 20).is_empty());
        assert!(page_window(-2, 8, 20).is_empty());
        assert!(page_window(i64::MAX, 8, 20).is_empty());
    }

    #[test]
    fn paginate_slices_items() {
        let items: Vec<u32> = (1..=10).collect();
        assert_eq!(paginate(&items, 1), &items[..8]);
        assert_eq!(paginate(&items, 2), &[9, 10]);
        assert!(paginate(&items, 3).is_empty());
    }
}
