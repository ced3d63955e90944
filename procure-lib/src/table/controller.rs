//! The table controller

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::runtime::Handle;
use tokio::sync::watch;

use super::Debouncer;
use super::TableConfig;
use super::TableModel;
use super::TableState;
use super::UrlKeys;
use super::last_page_index;
use super::page_count;
use super::query;
use super::url;
use crate::api::ListClient;
use crate::api::query::Direction;
use crate::api::query::FacetQuery;
use crate::api::query::Filter;
use crate::api::query::OrderBy;
use crate::api::query::Page;
use crate::api::query::RemoteQuery;
use crate::error::ConfigError;
use crate::error::Error;
use crate::model::FacetValue;
use crate::url_state::NamespaceClaim;
use crate::url_state::Subscription;
use crate::url_state::UrlStateManager;

/// When a state change is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    /// Right away, flushing any pending search.
    Immediate,
    /// After the search debounce window.
    Debounced,
    /// Not at all; the query does not depend on the change.
    Skip,
}

/// Controller for one server-driven table view.
///
/// Owns the view's [`TableState`], mirrors it into the URL under the
/// configured `url_sync_key`, and keeps a [`TableModel`] in sync with the
/// backend through a [`ListClient`].
///
/// Dropping the controller (or calling [`dispose`](Self::dispose)) releases
/// its URL subscriptions and namespace, cancels a pending search and makes
/// every in-flight response irrelevant.
///
/// # Example
///
/// ```ignore
/// let urls = UrlStateManager::in_memory("pr_new_page=2");
/// let table = ServerDataTable::new(config, Arc::new(client), urls.clone())?;
///
/// table.set_column_filter(Filter::eq("project", "PROJ-001"));
/// table.set_search_term("cement");
///
/// let mut model = table.subscribe();
/// while model.changed().await.is_ok() {
///     render(&model.borrow());
/// }
/// ```
pub struct ServerDataTable {
    inner: Arc<TableInner>,
    subscriptions: Vec<Subscription>,
    claim: Option<NamespaceClaim>,
}

struct TableInner {
    config: TableConfig,
    keys: UrlKeys,
    client: Arc<dyn ListClient>,
    urls: UrlStateManager,
    runtime: Handle,
    data: Mutex<TableData>,
    model: watch::Sender<TableModel>,
    /// Identity of the most recently issued fetch.
    sequence: AtomicU64,
    disposed: AtomicBool,
    debouncer: Debouncer,
}

struct TableData {
    state: TableState,
    /// Search term queries are derived with. Trails `state.search_term`
    /// while the debounce window is open.
    applied_search: String,
    last_query: Option<RemoteQuery>,
}

impl TableData {
    fn effective_state(&self) -> TableState {
        TableState {
            search_term: self.applied_search.clone(),
            ..self.state.clone()
        }
    }
}

impl ServerDataTable {
    /// Mounts a table: validates the config, claims its URL namespace,
    /// restores state from the URL and issues the first fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: TableConfig,
        client: Arc<dyn ListClient>,
        urls: UrlStateManager,
    ) -> Result<Self, Error> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        let claim = urls.claim_namespace(&config.url_sync_key)?;
        let keys = UrlKeys::new(&config.url_sync_key);

        let state = url::decode(&urls, &config, &keys);
        // rewrite so malformed params disappear from the address bar
        url::write(&urls, &url::encode(&state, &config, &keys));

        let (model, _) = watch::channel(TableModel::default());
        let debouncer = Debouncer::new(config.search_debounce, runtime.clone());

        let inner = Arc::new(TableInner {
            config,
            keys,
            client,
            urls,
            runtime,
            data: Mutex::new(TableData {
                applied_search: state.search_term.clone(),
                state,
                last_query: None,
            }),
            model,
            sequence: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
            debouncer,
        });

        let subscriptions = inner
            .keys
            .all()
            .iter()
            .map(|key| {
                let weak = Arc::downgrade(&inner);
                inner.urls.subscribe(key, move |_, _| {
                    if let Some(inner) = weak.upgrade() {
                        inner.sync_from_url();
                    }
                })
            })
            .collect();

        log::debug!(
            "[{}] mounted table for {}",
            inner.config.url_sync_key,
            inner.config.resource
        );
        inner.run_query(false);

        Ok(Self {
            inner,
            subscriptions,
            claim: Some(claim),
        })
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Returns the table's configuration.
    pub fn config(&self) -> &TableConfig {
        &self.inner.config
    }

    /// Returns the URL parameter names this table owns.
    pub fn url_keys(&self) -> &UrlKeys {
        &self.inner.keys
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> TableState {
        self.inner.data().state.clone()
    }

    /// Returns a snapshot of the current model.
    pub fn model(&self) -> TableModel {
        self.inner.model.borrow().clone()
    }

    /// Returns a receiver that observes every model replacement.
    pub fn subscribe(&self) -> watch::Receiver<TableModel> {
        self.inner.model.subscribe()
    }

    /// Returns the number of pages for the current total and page size.
    pub fn page_count(&self) -> usize {
        let total = self.inner.model.borrow().total_count;
        page_count(total, self.inner.data().state.page_size)
    }

    /// The query for the current page, as last derived.
    pub fn current_query(&self) -> RemoteQuery {
        let data = self.inner.data();
        query::derive_query(&self.inner.config, &data.effective_state())
    }

    /// The current filters and ordering without pagination.
    ///
    /// Meant for "export all matching rows" actions of the surrounding page.
    pub fn export_query(&self) -> RemoteQuery {
        let data = self.inner.data();
        query::export_query(&self.inner.config, &data.effective_state())
    }

    /// The facet query for a facet-enabled column.
    pub fn facet_query(&self, field: &str) -> Result<FacetQuery, ConfigError> {
        match self.inner.config.column(field) {
            Some(column) if column.facet => {}
            _ => return Err(ConfigError::FieldNotFacetable(field.to_string())),
        }
        let data = self.inner.data();
        Ok(query::facet_query(
            &self.inner.config,
            &data.effective_state(),
            field,
        ))
    }

    /// Fetches the distinct values of a facet-enabled column under every
    /// other active filter.
    pub async fn fetch_facet_values(&self, field: &str) -> Result<Vec<FacetValue>, Error> {
        let query = self.facet_query(field)?;
        let client = Arc::clone(&self.inner.client);
        client.get_facet_values(&query).await
    }

    /// Waits until no fetch is in flight and returns the model.
    ///
    /// A search still inside its debounce window is fetched right away.
    pub async fn settled(&self) -> Result<TableModel, Error> {
        if self.inner.debouncer.is_pending() {
            self.inner.refresh(Refresh::Immediate);
        }
        let mut rx = self.inner.model.subscribe();
        let model = rx
            .wait_for(|m| !m.is_loading)
            .await
            .map_err(|_| Error::Disposed)?;
        Ok(model.clone())
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Moves to a page. Filters and sort are untouched.
    pub fn set_page_index(&self, page_index: usize) {
        self.inner
            .mutate(Refresh::Immediate, |s| s.page_index = page_index);
    }

    /// Moves to the next page. Returns `false` on the last page.
    pub fn next_page(&self) -> bool {
        let total = self.inner.model.borrow().total_count;
        let state = self.state();
        if state.page_index >= last_page_index(total, state.page_size) {
            return false;
        }
        self.set_page_index(state.page_index + 1);
        true
    }

    /// Moves to the previous page. Returns `false` on the first page.
    pub fn previous_page(&self) -> bool {
        let page_index = self.state().page_index;
        if page_index == 0 {
            return false;
        }
        self.set_page_index(page_index - 1);
        true
    }

    /// Changes the page size and returns to the first page.
    ///
    /// Sizes that are zero or not among the configured options are ignored.
    pub fn set_page_size(&self, page_size: usize) {
        if !self.inner.config.accepts_page_size(page_size) {
            log::warn!(
                "[{}] ignoring unsupported page size {}",
                self.inner.config.url_sync_key,
                page_size
            );
            return;
        }
        self.inner.mutate(Refresh::Immediate, |s| {
            if s.page_size != page_size {
                s.page_size = page_size;
                s.page_index = 0;
            }
        });
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Sorts by a field and returns to the first page.
    pub fn set_sort(&self, field: impl Into<String>, direction: Direction) {
        let order = OrderBy::new(field, direction);
        self.inner.mutate(Refresh::Immediate, |s| {
            if s.sort.as_ref() != Some(&order) {
                s.sort = Some(order);
                s.page_index = 0;
            }
        });
    }

    /// Header-click behaviour: reverses the direction if already sorted by
    /// `field`, otherwise sorts by it in the column's default direction.
    pub fn toggle_sort(&self, field: &str) {
        let current = self.state().sort;
        let direction = match current {
            Some(order) if order.field == field => order.direction.reversed(),
            _ => self
                .inner
                .config
                .column(field)
                .and_then(|c| c.default_sort)
                .unwrap_or(Direction::Asc),
        };
        self.set_sort(field, direction);
    }

    /// Restores the default ordering.
    pub fn clear_sort(&self) {
        let default = self.inner.config.resolved_default_sort();
        self.inner.mutate(Refresh::Immediate, |s| {
            if s.sort != default {
                s.sort = default;
                s.page_index = 0;
            }
        });
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Adds a filter, replacing any existing filter on the same field, and
    /// returns to the first page.
    ///
    /// `json-contains` filters are ignored: JSON fields are only searchable
    /// through the search box.
    pub fn set_column_filter(&self, filter: Filter) {
        if self.inner.rejects_json_filter(&filter) {
            return;
        }
        self.inner.mutate(Refresh::Immediate, |s| {
            if s.column_filter(&filter.field) != Some(&filter) {
                s.upsert_filter(filter);
                s.page_index = 0;
            }
        });
    }

    /// Removes the filter on a field.
    pub fn remove_column_filter(&self, field: &str) {
        self.inner.mutate(Refresh::Immediate, |s| {
            if s.remove_filter(field) {
                s.page_index = 0;
            }
        });
    }

    /// Replaces every user filter. Later filters on an already present field
    /// win; `json-contains` filters are ignored.
    pub fn set_column_filters(&self, filters: impl IntoIterator<Item = Filter>) {
        let mut next = TableState {
            column_filters: Vec::new(),
            ..self.state()
        };
        for filter in filters {
            if !self.inner.rejects_json_filter(&filter) {
                next.upsert_filter(filter);
            }
        }
        let filters = next.column_filters;
        self.inner.mutate(Refresh::Immediate, |s| {
            if s.column_filters != filters {
                s.column_filters = filters;
                s.page_index = 0;
            }
        });
    }

    /// Removes every user filter.
    pub fn clear_filters(&self) {
        self.set_column_filters(Vec::new());
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Selects the field the search box searches.
    pub fn set_search_field(&self, field: &str) -> Result<(), ConfigError> {
        if self.inner.config.search_field(field).is_none() {
            return Err(ConfigError::UnknownSearchField(field.to_string()));
        }
        self.inner.mutate(Refresh::Immediate, |s| {
            if s.search_field.as_deref() != Some(field) {
                s.search_field = Some(field.to_string());
                if !s.search_term.trim().is_empty() {
                    s.page_index = 0;
                }
            }
        });
        Ok(())
    }

    /// Updates the search term.
    ///
    /// State and URL change immediately; the fetch waits until the term has
    /// been stable for the configured debounce window.
    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.inner.mutate(Refresh::Debounced, |s| {
            if s.search_term != term {
                s.search_term = term;
                s.page_index = 0;
            }
        });
    }

    /// Clears the search term and fetches right away.
    pub fn clear_search(&self) {
        self.inner.mutate(Refresh::Immediate, |s| {
            if !s.search_term.is_empty() {
                s.search_term.clear();
                s.page_index = 0;
            }
        });
    }

    // =========================================================================
    // Row selection
    // =========================================================================

    fn selection_enabled(&self) -> bool {
        if !self.inner.config.enable_row_selection {
            log::debug!(
                "[{}] row selection is disabled",
                self.inner.config.url_sync_key
            );
        }
        self.inner.config.enable_row_selection
    }

    /// Selects or deselects a row. Returns whether it is selected afterwards.
    pub fn toggle_row(&self, id: &str) -> bool {
        if !self.selection_enabled() {
            return false;
        }
        let mut selected = false;
        self.inner.mutate(Refresh::Skip, |s| {
            selected = s.row_selection.insert(id.to_string());
            if !selected {
                s.row_selection.remove(id);
            }
        });
        selected
    }

    /// Replaces the selection.
    pub fn set_row_selection(&self, ids: impl IntoIterator<Item = String>) {
        if !self.selection_enabled() {
            return;
        }
        let ids: BTreeSet<String> = ids.into_iter().collect();
        self.inner
            .mutate(Refresh::Skip, |s| s.row_selection = ids);
    }

    /// Selects every row on the current page, keeping earlier selections.
    pub fn select_all_on_page(&self) {
        if !self.selection_enabled() {
            return;
        }
        let ids = self.inner.model.borrow().row_ids();
        self.inner
            .mutate(Refresh::Skip, |s| s.row_selection.extend(ids));
    }

    /// Deselects every row.
    pub fn clear_row_selection(&self) {
        if !self.selection_enabled() {
            return;
        }
        self.inner
            .mutate(Refresh::Skip, |s| s.row_selection.clear());
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Fetches the current query again, skipping any debounce, without
    /// changing state.
    pub fn refetch(&self) {
        self.inner.debouncer.cancel();
        self.inner.apply_search();
        self.inner.run_query(true);
    }

    /// Unmounts the table: releases the URL subscriptions and namespace,
    /// cancels a pending search and ignores every in-flight response.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        // invalidate whatever is in flight
        self.inner.sequence.fetch_add(1, Ordering::SeqCst);
        self.inner.debouncer.cancel();
        self.subscriptions.clear();
        self.claim.take();
        log::debug!("[{}] disposed", self.inner.config.url_sync_key);
    }
}

impl Drop for ServerDataTable {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ServerDataTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDataTable")
            .field("resource", &self.inner.config.resource)
            .field("url_sync_key", &self.inner.config.url_sync_key)
            .field("state", &self.state())
            .finish()
    }
}

impl TableInner {
    fn data(&self) -> MutexGuard<'_, TableData> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// State change → URL write → refresh.
    fn mutate(self: &Arc<Self>, refresh: Refresh, f: impl FnOnce(&mut TableState)) {
        if self.is_disposed() {
            return;
        }
        let params = {
            let mut data = self.data();
            let before = data.state.clone();
            f(&mut data.state);
            if data.state == before {
                return;
            }
            url::encode(&data.state, &self.config, &self.keys)
        };
        url::write(&self.urls, &params);
        self.refresh(refresh);
    }

    fn refresh(self: &Arc<Self>, refresh: Refresh) {
        match refresh {
            Refresh::Immediate => {
                self.debouncer.cancel();
                self.apply_search();
                self.run_query(false);
            }
            Refresh::Debounced => {
                let weak = Arc::downgrade(self);
                self.debouncer.arm(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.apply_search();
                        inner.run_query(false);
                    }
                });
            }
            Refresh::Skip => {}
        }
    }

    fn apply_search(&self) {
        let mut data = self.data();
        if data.applied_search != data.state.search_term {
            data.applied_search = data.state.search_term.clone();
        }
    }

    fn rejects_json_filter(&self, filter: &Filter) -> bool {
        if !filter.is_json_search() {
            return false;
        }
        log::warn!(
            "[{}] ignoring json-contains filter on {}: JSON fields are searched through the search box",
            self.config.url_sync_key,
            filter.field
        );
        true
    }

    /// Derives the query and fetches it unless it equals the last one issued.
    ///
    /// Deriving, numbering and flagging the model as loading happen under the
    /// state lock, so the highest sequence number always belongs to the query
    /// derived from the newest state.
    fn run_query(self: &Arc<Self>, force: bool) {
        if self.is_disposed() {
            return;
        }
        let (sequence, query) = {
            let mut data = self.data();
            let query = query::derive_query(&self.config, &data.effective_state());
            if !force && data.last_query.as_ref() == Some(&query) {
                return;
            }
            data.last_query = Some(query.clone());
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            self.model.send_modify(|m| m.is_loading = true);
            (sequence, query)
        };
        self.spawn_fetch(sequence, query);
    }

    fn spawn_fetch(self: &Arc<Self>, sequence: u64, query: RemoteQuery) {
        log::debug!(
            "[{}] fetch #{}: {} offset={} limit={:?} filters={}",
            self.config.url_sync_key,
            sequence,
            query.doctype,
            query.offset,
            query.limit,
            query.filters.len()
        );

        let weak = Arc::downgrade(self);
        let client = Arc::clone(&self.client);
        self.runtime.spawn(async move {
            let result = client.get_list(&query).await;
            if let Some(inner) = weak.upgrade() {
                inner.complete_fetch(sequence, result);
            }
        });
    }

    fn complete_fetch(self: &Arc<Self>, sequence: u64, result: Result<Page, Error>) {
        let mut data = self.data();
        // checked under the lock: no newer fetch can be issued until the
        // model below is published
        if self.is_disposed() || self.sequence.load(Ordering::SeqCst) != sequence {
            log::debug!(
                "[{}] discarding stale response #{}",
                self.config.url_sync_key,
                sequence
            );
            return;
        }

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                log::warn!(
                    "[{}] fetch #{} failed: {}",
                    self.config.url_sync_key,
                    sequence,
                    error
                );
                self.model.send_modify(|m| {
                    m.is_loading = false;
                    m.error = Some(Arc::new(error));
                });
                return;
            }
        };

        let (rows, total_count) = page.into_parts();
        if let Some(store) = &self.config.count_store {
            store.record(&self.config.resource, &self.config.url_sync_key, total_count);
        }

        let last = last_page_index(total_count, data.state.page_size);
        if data.state.page_index > last {
            log::info!(
                "[{}] page {} is past the last page, moving to page {}",
                self.config.url_sync_key,
                data.state.page_index.saturating_add(1),
                last + 1
            );
            data.state.page_index = last;
            let params = url::encode(&data.state, &self.config, &self.keys);
            drop(data);
            url::write(&self.urls, &params);
            self.run_query(false);
            return;
        }

        self.model.send_replace(TableModel {
            rows,
            total_count,
            is_loading: false,
            error: None,
        });
    }

    /// Re-reads state after the URL changed underneath the table.
    fn sync_from_url(self: &Arc<Self>) {
        if self.is_disposed() {
            return;
        }
        let mut next = url::decode(&self.urls, &self.config, &self.keys);
        {
            let mut data = self.data();
            next.row_selection = data.state.row_selection.clone();
            if next == data.state {
                return;
            }
            log::debug!("[{}] state restored from URL", self.config.url_sync_key);
            data.state = next;
        }
        self.refresh(Refresh::Immediate);
    }
}
