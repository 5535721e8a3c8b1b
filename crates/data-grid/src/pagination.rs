use std::ops::{Range, RangeInclusive};

use serde::Serialize;

/// Page arithmetic for one render of a grid.
///
/// `current_page` is the requested page clamped to `1..=total_pages`; there
/// is always at least one page, even for zero rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub requested_page: usize,
    pub previous_page: Option<usize>,
    pub next_page: Option<usize>,
    window_start: usize,
    window_end: usize,
}

impl Pagination {
    /// A zero `page_size` or `window` is treated as 1.
    pub fn new(total: usize, page_size: usize, page: usize, window: usize) -> Self {
        let page_size = page_size.max(1);
        let window = window.max(1);
        let total_pages = total.div_ceil(page_size).max(1);
        let current_page = page.clamp(1, total_pages);

        let window_start = (current_page - 1) / window * window + 1;
        let window_end = total_pages.min(window_start + window - 1);

        Self {
            total,
            page_size,
            total_pages,
            current_page,
            requested_page: page,
            previous_page: (current_page > 1).then(|| current_page - 1),
            next_page: (current_page < total_pages).then(|| current_page + 1),
            window_start,
            window_end,
        }
    }

    /// Page-number buttons. Window boundaries fall on multiples of the
    /// window size.
    pub fn page_numbers(&self) -> RangeInclusive<usize> {
        self.window_start..=self.window_end
    }

    /// Row indices shown on the current page.
    pub fn slice_range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn is_first(&self) -> bool {
        self.current_page == 1
    }

    pub fn is_last(&self) -> bool {
        self.current_page == self.total_pages
    }

    /// The page to write back when the requested page no longer exists.
    /// `None` once the holder already agrees with the current page.
    pub fn correction(&self) -> Option<usize> {
        (self.requested_page != self.current_page).then_some(self.current_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10, 1)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(23, 10, 3)]
    #[case(23, 0, 23)]
    fn total_pages(#[case] total: usize, #[case] size: usize, #[case] expected: usize) {
        assert_eq!(Pagination::new(total, size, 1, 5).total_pages, expected);
    }

    #[test]
    fn requested_page_past_end_is_corrected() {
        let pagination = Pagination::new(23, 10, 5, 5);
        assert_eq!(pagination.current_page, 3);
        assert_eq!(pagination.correction(), Some(3));
        assert_eq!(pagination.next_page, None);
        assert_eq!(pagination.previous_page, Some(2));
        assert_eq!(pagination.slice_range(), 20..23);

        assert_eq!(Pagination::new(23, 10, 3, 5).correction(), None);
        assert_eq!(Pagination::new(23, 10, 0, 5).current_page, 1);
    }

    #[rstest]
    #[case(1, 1..=5)]
    #[case(5, 1..=5)]
    #[case(6, 6..=10)]
    #[case(12, 11..=12)]
    fn window_is_anchored_to_multiples(
        #[case] page: usize,
        #[case] expected: RangeInclusive<usize>,
    ) {
        assert_eq!(Pagination::new(120, 10, page, 5).page_numbers(), expected);
    }

    #[test]
    fn empty_grid_still_has_one_empty_page() {
        let pagination = Pagination::new(0, 10, 1, 5);
        assert_eq!(pagination.page_numbers(), 1..=1);
        assert_eq!(pagination.slice_range(), 0..0);
        assert!(pagination.is_first() && pagination.is_last());
    }
}
