use serde::Serialize;

/// One page of a filtered record list. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<R: Clone> Page<R> {
    /// Slice `records` into page `page` of `page_size` items.
    ///
    /// Page numbers past the end clamp to the last page and page 0 reads as
    /// page 1. An empty list still has one (empty) page.
    pub fn of(records: &[R], page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_items = records.len();
        let total_pages = total_items.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);

        let start = (page - 1) * page_size;
        let end = (start + page_size).min(total_items);
        let items = records.get(start..end).map(<[R]>::to_vec).unwrap_or_default();

        Self {
            items,
            page,
            total_pages,
            total_items,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
