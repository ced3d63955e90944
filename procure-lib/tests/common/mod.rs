//! Scripted list backend shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use procure_lib::api::ListClient;
use procure_lib::api::query::FacetQuery;
use procure_lib::api::query::Page;
use procure_lib::api::query::RemoteQuery;
use procure_lib::error::ApiError;
use procure_lib::error::Error;
use procure_lib::model::FacetValue;
use procure_lib::model::Record;
use procure_lib::table::ColumnDef;
use procure_lib::table::SearchField;
use procure_lib::table::TableConfig;
use tokio::sync::oneshot;
use tokio::sync::watch;

type Reply = oneshot::Sender<Result<Page, Error>>;

/// A [`ListClient`] whose answers are controlled by the test.
///
/// In automatic mode every query is answered right away with a generated
/// page out of `total` rows named `DOC-0000`, `DOC-0001`, ...
/// In manual mode each call waits until the test calls [`respond`](Self::respond).
pub struct ScriptedClient {
    total: AtomicUsize,
    failing: AtomicBool,
    manual: bool,
    pending: Mutex<Vec<Option<Reply>>>,
    queries: Mutex<Vec<RemoteQuery>>,
    facet_queries: Mutex<Vec<FacetQuery>>,
    calls: watch::Sender<usize>,
}

impl ScriptedClient {
    fn build(total: usize, manual: bool) -> Arc<Self> {
        let (calls, _) = watch::channel(0);
        Arc::new(Self {
            total: AtomicUsize::new(total),
            failing: AtomicBool::new(false),
            manual,
            pending: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            facet_queries: Mutex::new(Vec::new()),
            calls,
        })
    }

    pub fn with_total(total: usize) -> Arc<Self> {
        Self::build(total, false)
    }

    pub fn manual() -> Arc<Self> {
        Self::build(0, true)
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<RemoteQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn facet_queries(&self) -> Vec<FacetQuery> {
        self.facet_queries.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> RemoteQuery {
        self.queries.lock().unwrap().last().cloned().expect("no query issued")
    }

    /// Waits until at least `count` list calls have reached the client.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut rx = self.calls.subscribe();
        rx.wait_for(|c| *c >= count).await.expect("client dropped");
    }

    /// Answers the `index`-th list call (zero-based) in manual mode.
    pub fn respond(&self, index: usize, result: Result<Page, Error>) {
        let reply = self.pending.lock().unwrap()[index]
            .take()
            .expect("call already answered");
        let _ = reply.send(result);
    }

    /// Builds the page a backend holding `total` rows would return.
    pub fn page_for(query: &RemoteQuery, total: usize) -> Page {
        let start = query.offset.min(total);
        let end = match query.limit {
            Some(limit) => (start + limit).min(total),
            None => total,
        };
        let records = (start..end).map(row).collect();
        Page::new(records, total)
    }
}

pub fn row(index: usize) -> Record {
    Record::new()
        .set("name", format!("DOC-{index:04}"))
        .set("status", "Open")
}

pub fn server_error() -> Error {
    ApiError::http(500, "Internal Server Error").into()
}

#[async_trait]
impl ListClient for ScriptedClient {
    async fn get_list(&self, query: &RemoteQuery) -> Result<Page, Error> {
        self.queries.lock().unwrap().push(query.clone());

        if self.manual {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push(Some(tx));
            self.calls.send_modify(|c| *c += 1);
            return rx.await.unwrap_or_else(|_| Err(Error::Disposed));
        }

        self.calls.send_modify(|c| *c += 1);
        if self.failing.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(Self::page_for(query, self.total.load(Ordering::SeqCst)))
    }

    async fn get_facet_values(&self, query: &FacetQuery) -> Result<Vec<FacetValue>, Error> {
        self.facet_queries.lock().unwrap().push(query.clone());
        Ok(vec![
            FacetValue::new("Open", 7),
            FacetValue::new("Approved", 3),
        ])
    }
}

/// The purchase requisition table used across the tests.
pub fn requisition_config() -> TableConfig {
    TableConfig::new(
        "Purchase Requisition",
        "pr_new",
        ["name", "project", "status", "supplier", "grand_total", "items", "modified"],
    )
    .with_columns([
        ColumnDef::new("name"),
        ColumnDef::new("project").with_facet(),
        ColumnDef::new("status").with_facet(),
        ColumnDef::new("modified").with_default_sort(procure_lib::api::query::Direction::Desc),
    ])
    .with_search_field(SearchField::new("name", "ID").as_default())
    .with_search_field(SearchField::new("supplier", "Supplier"))
    .with_search_field(SearchField::new("items", "Items").json())
    .with_page_size(10)
}
