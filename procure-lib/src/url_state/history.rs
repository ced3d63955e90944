//! Address bar backends.

use std::sync::Arc;
use std::sync::Mutex;

/// Whether a URL write adds a history entry or overwrites the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Overwrite the current entry (`history.replaceState`).
    #[default]
    Replace,
    /// Add a new entry (`history.pushState`).
    Push,
}

/// The host's address bar.
///
/// Writes must never reload the page. Back/forward are optional: hosts whose
/// navigation is driven externally (a browser's `popstate`) leave them as
/// `None` and call [`UrlStateManager::navigate`](super::UrlStateManager::navigate)
/// from their own event loop instead.
pub trait HistoryBackend: Send + Sync {
    /// Overwrites the current entry's query string.
    fn replace(&self, query: &str);

    /// Adds a new entry with the given query string.
    fn push(&self, query: &str);

    /// Steps back one entry, returning its query string.
    fn back(&self) -> Option<String> {
        None
    }

    /// Steps forward one entry, returning its query string.
    fn forward(&self) -> Option<String> {
        None
    }
}

/// In-process history stack for hosts without a browser (CLI, tests).
///
/// Cheap to clone; clones share the same stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    inner: Arc<Mutex<MemoryHistoryState>>,
}

#[derive(Debug)]
struct MemoryHistoryState {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    /// Creates a history with a single entry.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryHistoryState {
                entries: vec![initial.into()],
                index: 0,
            })),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryHistoryState) -> R) -> R {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Returns the query string of the current entry.
    pub fn current(&self) -> String {
        self.with_state(|s| s.entries[s.index].clone())
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.with_state(|s| s.entries.len())
    }

    /// Returns `true` if there are no entries. Never the case in practice.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl HistoryBackend for MemoryHistory {
    fn replace(&self, query: &str) {
        self.with_state(|s| s.entries[s.index] = query.to_string());
    }

    fn push(&self, query: &str) {
        self.with_state(|s| {
            // pushing drops any forward entries, like a browser does
            s.entries.truncate(s.index + 1);
            s.entries.push(query.to_string());
            s.index = s.entries.len() - 1;
        });
    }

    fn back(&self) -> Option<String> {
        self.with_state(|s| {
            if s.index == 0 {
                return None;
            }
            s.index -= 1;
            Some(s.entries[s.index].clone())
        })
    }

    fn forward(&self) -> Option<String> {
        self.with_state(|s| {
            if s.index + 1 >= s.entries.len() {
                return None;
            }
            s.index += 1;
            Some(s.entries[s.index].clone())
        })
    }
}
