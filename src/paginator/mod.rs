//! Pure pagination math over an in-memory record set.

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// One window of a record set.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<'a, T> {
    pub rows: &'a [T],
    /// 0-based offset of the first row into the full set.
    pub first_index: usize,
    pub total_pages: usize,
}

impl<'a, T> Page<'a, T> {
    /// Rows paired with their 1-based ordinal, continuous across pages.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &'a T)> {
        let first_index = self.first_index;
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, row)| (first_index + i + 1, row))
    }
}

/// Number of pages needed for `item_count` items; 0 for an empty set.
pub fn total_pages(item_count: usize, page_size: usize) -> usize {
    item_count.div_ceil(page_size.max(1))
}

/// Slices out page `page_number` (1-based).
///
/// `page_number` is not clamped: a page past the end yields no rows. Callers
/// only request numbers from [`page_numbers`].
pub fn compute_page<T>(records: &[T], page_size: usize, page_number: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let first_index = page_number.saturating_sub(1).saturating_mul(page_size);
    let start = first_index.min(records.len());
    let end = first_index.saturating_add(page_size).min(records.len());
    Page {
        rows: &records[start..end],
        first_index,
        total_pages: total_pages(records.len(), page_size),
    }
}

/// The page numbers a selector may offer.
pub fn page_numbers(total_pages: usize) -> Vec<usize> {
    (1..=total_pages).collect()
}
