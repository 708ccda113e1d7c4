use serde::Serialize;

use crate::domain::audience::Pagination;

fn get_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = (current_page + right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

/// Page strip for a pager control; `None` marks an ellipsis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageStrip {
    pub pages: Vec<Option<usize>>,
    pub page: usize,
    /// Pager is hidden for a single page.
    pub visible: bool,
}

impl PageStrip {
    pub fn new(pagination: &Pagination) -> Self {
        let current_page = if pagination.page == 0 {
            1
        } else {
            pagination.page
        };

        Self {
            pages: get_pages(pagination.total_pages, current_page, 2, 2, 4, 2),
            page: current_page,
            visible: pagination.total_pages > 1,
        }
    }
}
