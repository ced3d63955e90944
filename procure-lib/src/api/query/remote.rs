//! Remote query descriptions handed to a [`ListClient`](crate::api::ListClient).

use super::Filter;
use super::OrderBy;

/// A complete list request: which records, which fields, in what order,
/// and which slice of them.
///
/// Queries are plain values. Two queries built from the same inputs compare
/// equal, which is what the table controller relies on to skip redundant
/// fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteQuery {
    /// The remote collection (DocType) name.
    pub doctype: String,
    /// Fields to return for each record.
    pub fields: Vec<String>,
    /// Conditions, combined with AND.
    pub filters: Vec<Filter>,
    /// Result ordering.
    pub order_by: Option<OrderBy>,
    /// Maximum number of records to return. `None` returns everything.
    pub limit: Option<usize>,
    /// Number of records to skip.
    pub offset: usize,
}

impl RemoteQuery {
    /// Creates an unfiltered, unordered query for all records of a doctype.
    pub fn new(doctype: impl Into<String>, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            doctype: doctype.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
            offset: 0,
        }
    }

    /// Appends a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets the ordering.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Sets limit and offset from a zero-based page index and page size.
    pub fn paginate(mut self, page_index: usize, page_size: usize) -> Self {
        self.limit = Some(page_size);
        self.offset = page_index.saturating_mul(page_size);
        self
    }

    /// Returns the JSON-field search predicate, if the query carries one.
    pub fn json_search(&self) -> Option<&Filter> {
        self.filters.iter().find(|f| f.is_json_search())
    }

    /// Returns every filter except JSON-field search predicates.
    pub fn plain_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(|f| !f.is_json_search())
    }
}

/// Request for the distinct values of one field under a set of filters.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetQuery {
    /// The remote collection (DocType) name.
    pub doctype: String,
    /// The field whose distinct values are wanted.
    pub field: String,
    /// Conditions, combined with AND.
    pub filters: Vec<Filter>,
}

impl FacetQuery {
    /// Returns the JSON-field search predicate, if the query carries one.
    pub fn json_search(&self) -> Option<&Filter> {
        self.filters.iter().find(|f| f.is_json_search())
    }

    /// Returns every filter except JSON-field search predicates.
    pub fn plain_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(|f| !f.is_json_search())
    }
}
