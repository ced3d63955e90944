//! URL-backed key/value state.
//!
//! [`UrlStateManager`] keeps an in-memory copy of the address bar's query
//! parameters, writes changes back through a [`HistoryBackend`] and notifies
//! per-key subscribers whenever a value changes, whether the change came from
//! [`UrlStateManager::update_param`] or from external navigation.
//!
//! Everything runs on the caller's thread. Callbacks are invoked after all
//! internal locks are released, so a callback may read or write the manager.

mod history;

pub use history::*;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use url::form_urlencoded;

use crate::error::ConfigError;

/// Subscriber callback: `(key, new_value)`. `None` means the key was removed.
pub type ParamCallback = Arc<dyn Fn(&str, Option<&str>) + Send + Sync>;

/// Process-wide view of the address bar's query parameters.
///
/// Cheap to clone; clones share the same state. Construct one per window and
/// pass it to every table that should persist its state in the URL.
///
/// # Example
///
/// ```
/// use procure_lib::url_state::{MemoryHistory, UrlStateManager};
///
/// let history = MemoryHistory::new("tab=Approved");
/// let urls = UrlStateManager::new("tab=Approved", history.clone());
///
/// urls.update_param("po_page", Some("2"));
/// assert_eq!(urls.get_param("po_page").as_deref(), Some("2"));
/// assert_eq!(history.current(), "tab=Approved&po_page=2");
///
/// urls.update_param("po_page", None);
/// assert_eq!(history.current(), "tab=Approved");
/// ```
#[derive(Clone)]
pub struct UrlStateManager {
    inner: Arc<UrlStateInner>,
}

struct UrlStateInner {
    data: Mutex<UrlStateData>,
    history: Arc<dyn HistoryBackend>,
    next_subscription: AtomicU64,
}

#[derive(Default)]
struct UrlStateData {
    /// Ordered `(key, value)` pairs. Values are never empty.
    params: Vec<(String, String)>,
    subscribers: HashMap<String, Vec<(u64, ParamCallback)>>,
    namespaces: HashSet<String>,
}

impl UrlStateData {
    fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Applies a write and reports whether the value changed.
    fn set(&mut self, key: &str, value: Option<&str>) -> bool {
        let position = self.params.iter().position(|(k, _)| k == key);
        match (position, value) {
            (Some(i), Some(v)) if self.params[i].1 == v => false,
            (Some(i), Some(v)) => {
                self.params[i].1 = v.to_string();
                true
            }
            (Some(i), None) => {
                self.params.remove(i);
                true
            }
            (None, Some(v)) => {
                self.params.push((key.to_string(), v.to_string()));
                true
            }
            (None, None) => false,
        }
    }

    fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    fn callbacks_for(&self, keys: &[String]) -> Vec<(String, ParamCallback)> {
        let mut out = Vec::new();
        for key in keys {
            if let Some(subs) = self.subscribers.get(key) {
                out.extend(subs.iter().map(|(_, cb)| (key.clone(), Arc::clone(cb))));
            }
        }
        out
    }
}

/// Parses a query string into ordered pairs.
///
/// A leading `?` is ignored, the last occurrence of a repeated key wins and
/// keys with empty values are treated as absent. Invalid percent-encoding is
/// decoded lossily rather than rejected.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let query = query.trim().trim_start_matches('?');
    let mut params: Vec<(String, String)> = Vec::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        params.retain(|(k, _)| k.as_str() != &*key);
        if !value.is_empty() {
            params.push((key.into_owned(), value.into_owned()));
        }
    }
    params
}

impl UrlStateManager {
    /// Creates a manager seeded from the current query string.
    pub fn new(initial_query: &str, history: impl HistoryBackend + 'static) -> Self {
        Self {
            inner: Arc::new(UrlStateInner {
                data: Mutex::new(UrlStateData {
                    params: parse_query(initial_query),
                    ..Default::default()
                }),
                history: Arc::new(history),
                next_subscription: AtomicU64::new(1),
            }),
        }
    }

    /// Creates a manager backed by a fresh [`MemoryHistory`].
    pub fn in_memory(initial_query: &str) -> Self {
        Self::new(initial_query, MemoryHistory::new(initial_query))
    }

    fn data(&self) -> MutexGuard<'_, UrlStateData> {
        self.inner
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the current value of a key, or `None` if it is absent.
    pub fn get_param(&self, key: &str) -> Option<String> {
        self.data().get(key).map(str::to_string)
    }

    /// Returns all current parameters in URL order.
    pub fn params(&self) -> Vec<(String, String)> {
        self.data().params.clone()
    }

    /// Returns the current query string (without a leading `?`).
    pub fn query_string(&self) -> String {
        self.data().query_string()
    }

    /// Sets or removes a single key, replacing the current history entry.
    ///
    /// `None` or an empty string removes the key. Other keys are untouched.
    pub fn update_param(&self, key: &str, value: Option<&str>) {
        self.update_params(&[(key, value)]);
    }

    /// Sets or removes several keys with a single address bar write,
    /// replacing the current history entry.
    pub fn update_params(&self, changes: &[(&str, Option<&str>)]) {
        self.write(changes, HistoryMode::Replace);
    }

    /// Like [`update_params`](Self::update_params) but adds a history entry,
    /// so the browser's back button returns to the previous state.
    pub fn push_params(&self, changes: &[(&str, Option<&str>)]) {
        self.write(changes, HistoryMode::Push);
    }

    fn write(&self, changes: &[(&str, Option<&str>)], mode: HistoryMode) {
        let (changed, query, callbacks) = {
            let mut data = self.data();
            let mut changed: Vec<String> = Vec::new();
            for (key, value) in changes {
                let value = value.filter(|v| !v.is_empty());
                if data.set(key, value) && !changed.iter().any(|k| k == key) {
                    changed.push((*key).to_string());
                }
            }
            if changed.is_empty() {
                return;
            }
            let callbacks = data.callbacks_for(&changed);
            (changed, data.query_string(), callbacks)
        };

        log::debug!("URL params changed: {:?}", changed);
        match mode {
            HistoryMode::Replace => self.inner.history.replace(&query),
            HistoryMode::Push => self.inner.history.push(&query),
        }
        self.notify(callbacks);
    }

    /// Applies an externally triggered navigation (back/forward, a pasted URL).
    ///
    /// The whole parameter set is replaced first; afterwards every subscriber
    /// of a key whose value differs is notified once.
    pub fn navigate(&self, query: &str) {
        let callbacks = {
            let mut data = self.data();
            let next = parse_query(query);

            let mut changed: Vec<String> = Vec::new();
            for (key, value) in &data.params {
                let new_value = next.iter().find(|(k, _)| k == key).map(|(_, v)| v);
                if new_value != Some(value) {
                    changed.push(key.clone());
                }
            }
            for (key, _) in &next {
                if data.get(key).is_none() {
                    changed.push(key.clone());
                }
            }

            data.params = next;
            if changed.is_empty() {
                return;
            }
            log::debug!("Navigation changed URL params: {:?}", changed);
            data.callbacks_for(&changed)
        };
        self.notify(callbacks);
    }

    /// Steps the history back and applies the resulting URL.
    ///
    /// Returns `false` if the backend has no earlier entry or does not
    /// support programmatic navigation.
    pub fn back(&self) -> bool {
        match self.inner.history.back() {
            Some(query) => {
                self.navigate(&query);
                true
            }
            None => false,
        }
    }

    /// Steps the history forward and applies the resulting URL.
    pub fn forward(&self) -> bool {
        match self.inner.history.forward() {
            Some(query) => {
                self.navigate(&query);
                true
            }
            None => false,
        }
    }

    fn notify(&self, callbacks: Vec<(String, ParamCallback)>) {
        for (key, callback) in callbacks {
            // read fresh: an earlier callback may have written this key again
            let value = self.get_param(&key);
            callback(&key, value.as_deref());
        }
    }

    /// Registers a callback for changes to one key.
    ///
    /// The subscription stays active until the returned guard is dropped or
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, key: &str, callback: F) -> Subscription
    where
        F: Fn(&str, Option<&str>) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.data()
            .subscribers
            .entry(key.to_string())
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            manager: Arc::downgrade(&self.inner),
            key: key.to_string(),
            id,
        }
    }

    /// Returns the number of live subscriptions for a key.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.data().subscribers.get(key).map_or(0, Vec::len)
    }

    /// Reserves a key namespace for one table.
    ///
    /// Two tables mounted at the same time with the same namespace would
    /// overwrite each other's parameters, so a second claim fails.
    pub fn claim_namespace(&self, namespace: &str) -> Result<NamespaceClaim, ConfigError> {
        if namespace.trim().is_empty() {
            return Err(ConfigError::EmptyUrlSyncKey);
        }
        let mut data = self.data();
        if !data.namespaces.insert(namespace.to_string()) {
            return Err(ConfigError::DuplicateUrlSyncKey(namespace.to_string()));
        }
        Ok(NamespaceClaim {
            manager: Arc::downgrade(&self.inner),
            namespace: namespace.to_string(),
        })
    }
}

impl std::fmt::Debug for UrlStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlStateManager")
            .field("query", &self.query_string())
            .finish()
    }
}

/// Guard for a key subscription. Dropping it unsubscribes.
pub struct Subscription {
    manager: Weak<UrlStateInner>,
    key: String,
    id: u64,
}

impl Subscription {
    /// Stops future notifications.
    pub fn unsubscribe(self) {
        // Drop does the work
    }

    /// Returns the subscribed key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.manager.upgrade() else {
            return;
        };
        let mut data = inner
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(subs) = data.subscribers.get_mut(&self.key) {
            subs.retain(|(id, _)| *id != self.id);
            if subs.is_empty() {
                data.subscribers.remove(&self.key);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

/// Guard for a claimed namespace. Dropping it releases the namespace.
#[derive(Debug)]
pub struct NamespaceClaim {
    manager: Weak<UrlStateInner>,
    namespace: String,
}

impl NamespaceClaim {
    /// Returns the claimed namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Drop for NamespaceClaim {
    fn drop(&mut self) {
        if let Some(inner) = self.manager.upgrade() {
            inner
                .data
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .namespaces
                .remove(&self.namespace);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn recorder() -> (Arc<Mutex<Vec<(String, Option<String>)>>>, impl Fn(&str, Option<&str>) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback = move |key: &str, value: Option<&str>| {
            sink.lock()
                .unwrap()
                .push((key.to_string(), value.map(str::to_string)));
        };
        (seen, callback)
    }

    #[test]
    fn test_parse_query() {
        let params = parse_query("?a=1&b=&c=x%20y&a=2");
        assert_eq!(
            params,
            vec![
                ("c".to_string(), "x y".to_string()),
                ("a".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_query_does_not_fail() {
        let urls = UrlStateManager::in_memory("a=%E0%A4%A&=orphan&&b");
        assert_eq!(urls.get_param("b"), None);
        assert!(urls.get_param("a").is_some());
    }

    #[test]
    fn test_update_preserves_other_keys() {
        let history = MemoryHistory::new("tab=Approved&x=1");
        let urls = UrlStateManager::new("tab=Approved&x=1", history.clone());

        urls.update_param("x", Some("2"));
        urls.update_param("y", Some("a b"));
        assert_eq!(history.current(), "tab=Approved&x=2&y=a+b");

        urls.update_param("x", Some(""));
        assert_eq!(urls.get_param("x"), None);
        assert_eq!(history.current(), "tab=Approved&y=a+b");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_subscribers_notified_once_per_change() {
        let urls = UrlStateManager::in_memory("");
        let (seen_a, cb_a) = recorder();
        let (seen_b, cb_b) = recorder();
        let _s1 = urls.subscribe("page", cb_a);
        let _s2 = urls.subscribe("page", cb_b);

        urls.update_param("page", Some("3"));
        urls.update_param("page", Some("3"));
        urls.update_param("other", Some("x"));

        assert_eq!(*seen_a.lock().unwrap(), vec![("page".to_string(), Some("3".to_string()))]);
        assert_eq!(seen_b.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let urls = UrlStateManager::in_memory("");
        let (seen, cb) = recorder();
        let sub = urls.subscribe("q", cb);
        urls.update_param("q", Some("cement"));
        sub.unsubscribe();
        urls.update_param("q", Some("steel"));

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(urls.subscriber_count("q"), 0);
    }

    #[test]
    fn test_navigation_notifies_changed_keys_only() {
        let history = MemoryHistory::new("a=1&b=1");
        let urls = UrlStateManager::new("a=1&b=1", history.clone());
        let (seen, cb) = recorder();
        let (seen_b, cb_b) = recorder();
        let _sa = urls.subscribe("a", cb);
        let _sb = urls.subscribe("b", cb_b);

        urls.push_params(&[("a", Some("2"))]);
        assert_eq!(history.len(), 2);
        seen.lock().unwrap().clear();

        assert!(urls.back());
        assert_eq!(urls.get_param("a").as_deref(), Some("1"));
        assert_eq!(*seen.lock().unwrap(), vec![("a".to_string(), Some("1".to_string()))]);
        assert!(seen_b.lock().unwrap().is_empty());

        assert!(urls.forward());
        assert_eq!(urls.get_param("a").as_deref(), Some("2"));
        assert!(!urls.forward());
    }

    #[test]
    fn test_navigation_removing_key() {
        let urls = UrlStateManager::in_memory("a=1");
        let (seen, cb) = recorder();
        let _s = urls.subscribe("a", cb);
        urls.navigate("");
        assert_eq!(*seen.lock().unwrap(), vec![("a".to_string(), None)]);
    }

    #[test]
    fn test_batch_write_notifies_after_all_applied() {
        let urls = UrlStateManager::in_memory("");
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let reader = urls.clone();
        let _s = urls.subscribe("a", move |_, _| {
            *sink.lock().unwrap() = reader.get_param("b");
        });

        urls.update_params(&[("a", Some("1")), ("b", Some("2"))]);
        assert_eq!(observed.lock().unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_callback_may_write_back() {
        let urls = UrlStateManager::in_memory("");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let writer = urls.clone();
        let _s = urls.subscribe("a", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            writer.update_param("b", Some("echo"));
        });

        urls.update_param("a", Some("1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(urls.get_param("b").as_deref(), Some("echo"));
    }

    #[test]
    fn test_namespace_claims() {
        let urls = UrlStateManager::in_memory("");
        let claim = urls.claim_namespace("pr_new").unwrap();
        assert_eq!(
            urls.claim_namespace("pr_new").unwrap_err(),
            ConfigError::DuplicateUrlSyncKey("pr_new".to_string())
        );
        assert!(urls.claim_namespace("pr_approved").is_ok());
        drop(claim);
        assert!(urls.claim_namespace("pr_new").is_ok());
        assert_eq!(urls.claim_namespace(" ").unwrap_err(), ConfigError::EmptyUrlSyncKey);
    }
}
