use serde::Serialize;

pub(crate) const LIST_PAGE_SIZE: i64 = 10;
pub(crate) const ADMIN_PAGE_SIZE: i64 = 20;
pub(crate) const MAX_PAGE_SIZE: i64 = 100;
pub(crate) const DEFAULT_TOP: usize = 100;
pub(crate) const MAX_TOP: usize = 1000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) page: i64,
    pub(crate) page_size: i64,
    pub(crate) total_items: i64,
    pub(crate) total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub(crate) fn new(items: Vec<T>, page: i64, page_size: i64, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + page_size - 1) / page_size
        };
        Self { items, page, page_size, total_items, total_pages }
    }
}

/// Out-of-range paging inputs are clamped, never rejected.
pub(crate) fn clamp_page(page: Option<i64>) -> i64 {
    page.filter(|value| *value >= 1).unwrap_or(1)
}

pub(crate) fn clamp_page_size(page_size: Option<i64>, default: i64) -> i64 {
    match page_size {
        Some(value) if value >= 1 => value.min(MAX_PAGE_SIZE),
        _ => default,
    }
}

pub(crate) fn clamp_top(top: Option<usize>) -> usize {
    match top {
        Some(value) if (1..=MAX_TOP).contains(&value) => value,
        _ => DEFAULT_TOP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_below_one_resets_to_one() {
        assert_eq!(clamp_page(Some(0)), 1);
        assert_eq!(clamp_page(Some(-3)), 1);
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some(7)), 7);
    }

    #[test]
    fn page_size_clamps_to_bounds() {
        assert_eq!(clamp_page_size(None, LIST_PAGE_SIZE), 10);
        assert_eq!(clamp_page_size(Some(0), ADMIN_PAGE_SIZE), 20);
        assert_eq!(clamp_page_size(Some(55), LIST_PAGE_SIZE), 55);
        assert_eq!(clamp_page_size(Some(500), LIST_PAGE_SIZE), 100);
    }

    #[test]
    fn top_outside_range_resets_to_default() {
        assert_eq!(clamp_top(None), 100);
        assert_eq!(clamp_top(Some(0)), 100);
        assert_eq!(clamp_top(Some(1001)), 100);
        assert_eq!(clamp_top(Some(25)), 25);
        assert_eq!(clamp_top(Some(1000)), 1000);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 1, 10, 21);
        assert_eq!(page.total_pages, 3);

        let empty: PaginatedResponse<i32> = PaginatedResponse::new(Vec::new(), 1, 10, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
