//! What the presentation layer renders.

use std::sync::Arc;

use crate::error::Error;
use crate::model::Record;

/// Rows and request status of a table.
///
/// Replaced as a whole on every change; never patched in place.
#[derive(Debug, Clone, Default)]
pub struct TableModel {
    /// Rows of the current page, in backend order.
    pub rows: Vec<Record>,
    /// Total number of matching records across all pages.
    pub total_count: usize,
    /// A fetch is in flight.
    pub is_loading: bool,
    /// Error of the most recent fetch, if it failed.
    ///
    /// Rows and count keep their last successful values alongside it.
    pub error: Option<Arc<Error>>,
}

impl TableModel {
    /// Returns `true` if the most recent fetch failed.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the identifiers (`name`) of the rows on this page.
    pub fn row_ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|r| r.name().map(str::to_string))
            .collect()
    }
}

impl PartialEq for TableModel {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.total_count == other.total_count
            && self.is_loading == other.is_loading
            && match (&self.error, &other.error) {
                (None, None) => true,
                (Some(a), Some(b)) => a.to_string() == b.to_string(),
                _ => false,
            }
    }
}
