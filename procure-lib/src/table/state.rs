//! Interactive table state

use std::collections::BTreeSet;

use super::TableConfig;
use crate::api::query::Filter;
use crate::api::query::OrderBy;

/// Everything the user can change about a table view.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    /// Zero-based page index.
    pub page_index: usize,
    /// Rows per page. Always positive.
    pub page_size: usize,
    /// Current ordering. `None` leaves ordering to the backend.
    pub sort: Option<OrderBy>,
    /// User-chosen filters, at most one per field, in the order they were added.
    pub column_filters: Vec<Filter>,
    /// Field the search box searches.
    pub search_field: Option<String>,
    /// Current search box contents.
    pub search_term: String,
    /// Identifiers (`name`) of selected rows.
    pub row_selection: BTreeSet<String>,
}

impl TableState {
    /// The state of a table nobody has touched yet.
    pub fn initial(config: &TableConfig) -> Self {
        Self {
            page_index: 0,
            page_size: config.page_size,
            sort: config.resolved_default_sort(),
            column_filters: Vec::new(),
            search_field: config.default_search_field().map(|s| s.field.clone()),
            search_term: String::new(),
            row_selection: BTreeSet::new(),
        }
    }

    /// Returns the user filter on a field, if any.
    pub fn column_filter(&self, field: &str) -> Option<&Filter> {
        self.column_filters.iter().find(|f| f.field == field)
    }

    /// Inserts or replaces the filter on the filter's field, keeping its position.
    pub(crate) fn upsert_filter(&mut self, filter: Filter) {
        match self.column_filters.iter_mut().find(|f| f.field == filter.field) {
            Some(existing) => *existing = filter,
            None => self.column_filters.push(filter),
        }
    }

    /// Removes the filter on a field. Returns `true` if one was removed.
    pub(crate) fn remove_filter(&mut self, field: &str) -> bool {
        let before = self.column_filters.len();
        self.column_filters.retain(|f| f.field != field);
        self.column_filters.len() != before
    }

    /// Offset of the first row of the current page.
    pub fn offset(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }
}

/// Index of the last page holding `total` rows, `0` when there are none.
pub fn last_page_index(total: usize, page_size: usize) -> usize {
    if page_size == 0 || total == 0 {
        0
    } else {
        (total - 1) / page_size
    }
}

/// Number of pages needed for `total` rows. An empty table has one (empty) page.
pub fn page_count(total: usize, page_size: usize) -> usize {
    last_page_index(total, page_size) + 1
}
