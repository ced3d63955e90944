//! Page type for paginated query results.

use crate::model::Record;

/// One page of list results together with the total number of matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    records: Vec<Record>,
    total_count: usize,
}

impl Page {
    /// Creates a new page.
    pub fn new(records: Vec<Record>, total_count: usize) -> Self {
        Self {
            records,
            total_count,
        }
    }

    /// Returns a reference to the records in this page.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the page and returns the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Consumes the page and returns records and total count.
    pub fn into_parts(self) -> (Vec<Record>, usize) {
        (self.records, self.total_count)
    }

    /// Returns the total number of records matching the query, across all pages.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Returns `true` if this page has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of records in this page.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
