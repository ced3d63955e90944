//! Shared document counts.
//!
//! Pages often show badges such as "Approved (12)" for tabs that are not
//! mounted. Tables publish the total of every successful fetch here so those
//! badges can be rendered without extra requests.

use chrono::DateTime;
use chrono::Utc;
use dashmap::DashMap;

/// A recorded count and when it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocCount {
    /// Number of matching documents.
    pub count: usize,
    /// When the count was recorded.
    pub updated_at: DateTime<Utc>,
}

/// Concurrent map of `(doctype, scope)` to the last known document count.
///
/// The scope distinguishes differently filtered views of the same doctype,
/// typically the table's URL sync key. Construct one per application and
/// share it by `Arc`.
///
/// # Example
///
/// ```
/// use procure_lib::counts::DocCountStore;
///
/// let counts = DocCountStore::new();
/// counts.record("Procurement Requests", "pr_new", 12);
/// assert_eq!(counts.get("Procurement Requests", "pr_new").unwrap().count, 12);
/// ```
#[derive(Debug, Default)]
pub struct DocCountStore {
    store: DashMap<(String, String), DocCount>,
}

impl DocCountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the count for a doctype under a scope, replacing any previous value.
    pub fn record(&self, doctype: &str, scope: &str, count: usize) {
        self.store.insert(
            (doctype.to_string(), scope.to_string()),
            DocCount {
                count,
                updated_at: Utc::now(),
            },
        );
    }

    /// Returns the last recorded count, if any.
    pub fn get(&self, doctype: &str, scope: &str) -> Option<DocCount> {
        self.store
            .get(&(doctype.to_string(), scope.to_string()))
            .map(|entry| *entry.value())
    }

    /// Returns every recorded scope of a doctype with its count.
    pub fn scopes(&self, doctype: &str) -> Vec<(String, usize)> {
        let mut scopes: Vec<(String, usize)> = self
            .store
            .iter()
            .filter(|entry| entry.key().0 == doctype)
            .map(|entry| (entry.key().1.clone(), entry.value().count))
            .collect();
        scopes.sort();
        scopes
    }

    /// Drops every count of a doctype, e.g. after one of its documents changed.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&self, doctype: &str) -> usize {
        let before = self.store.len();
        self.store.retain(|key, _| key.0 != doctype);
        before - self.store.len()
    }

    /// Removes all counts.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Returns the number of recorded entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
