//! Page number strip with ellipsis compression.

/// One slot of the page strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationModel {
    pub items: Vec<PageItem>,
    pub current: u32,
    pub total_pages: u32,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

/// Pages always shown at each end of the strip.
const EDGE: u32 = 1;
/// Pages shown on each side of the current page.
const AROUND: u32 = 1;

impl PaginationModel {
    /// Builds the strip, or `None` when pagination should be hidden
    /// (a single page or no items at all).
    ///
    /// ```
    /// use rentadmin::ui::pagination::{PageItem, PaginationModel};
    ///
    /// let model = PaginationModel::compute(3, 3, 47).unwrap();
    /// assert!(model.prev_enabled);
    /// assert!(!model.next_enabled);
    /// assert_eq!(model.items, vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]);
    ///
    /// assert!(PaginationModel::compute(1, 1, 7).is_none());
    /// ```
    #[must_use]
    pub fn compute(current: u32, total_pages: u32, total: u64) -> Option<Self> {
        if total_pages <= 1 || total == 0 {
            return None;
        }
        let current = current.max(1);

        Some(Self {
            items: page_items(total_pages, current.min(total_pages)),
            current,
            total_pages,
            prev_enabled: current > 1,
            next_enabled: current < total_pages,
        })
    }
}

fn page_items(last_page: u32, current: u32) -> Vec<PageItem> {
    let mut items = Vec::new();

    let left_end = (1 + EDGE).min(last_page + 1);
    items.extend((1..left_end).map(PageItem::Page));

    let mid_start = left_end.max(current.saturating_sub(AROUND));
    let mid_end = (current + AROUND + 1).min(last_page + 1);

    if mid_start > left_end {
        items.push(PageItem::Ellipsis);
    }
    items.extend((mid_start..mid_end).map(PageItem::Page));

    let right_start = mid_end.max(last_page.saturating_sub(EDGE) + 1);

    if right_start > mid_end {
        items.push(PageItem::Ellipsis);
    }
    items.extend((right_start..=last_page).map(PageItem::Page));

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    #[test]
    fn hidden_for_single_page_or_no_items() {
        assert!(PaginationModel::compute(1, 1, 10).is_none());
        assert!(PaginationModel::compute(1, 0, 0).is_none());
        assert!(PaginationModel::compute(1, 2, 0).is_none());
    }

    #[test]
    fn compresses_long_ranges() {
        let model = PaginationModel::compute(5, 10, 100).unwrap();
        assert_eq!(
            model.items,
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn first_page_disables_previous() {
        let model = PaginationModel::compute(1, 10, 100).unwrap();
        assert!(!model.prev_enabled);
        assert!(model.next_enabled);
        assert_eq!(model.items, vec![Page(1), Page(2), Ellipsis, Page(10)]);
    }

    #[test]
    fn out_of_range_page_keeps_next_disabled() {
        let model = PaginationModel::compute(9, 3, 47).unwrap();
        assert!(!model.next_enabled);
        assert!(model.prev_enabled);
    }
}
