//! Integration tests against a running backend.
//!
//! These tests need a reachable site with the data table methods installed
//! and are ignored by default. To run them, create a `.env` file in the
//! procure-lib directory with:
//!
//! ```env
//! PROCURE_URL=https://erp.example.com
//! PROCURE_API_KEY=your-api-key
//! PROCURE_API_SECRET=your-api-secret
//! # optional, defaults to "Purchase Requisition"
//! PROCURE_DOCTYPE=Purchase Requisition
//! ```
//!
//! Then run: `cargo test -p procure-lib --test frappe_live -- --ignored`

use std::env;
use std::sync::Arc;

use procure_lib::Credentials;
use procure_lib::FrappeClient;
use procure_lib::api::ListClient;
use procure_lib::api::query::FacetQuery;
use procure_lib::api::query::RemoteQuery;
use procure_lib::table::ServerDataTable;
use procure_lib::table::TableConfig;
use procure_lib::url_state::UrlStateManager;

fn load_env() -> Option<(FrappeClient, String)> {
    let _ = dotenvy::dotenv();

    let url = env::var("PROCURE_URL").ok()?;
    let key = env::var("PROCURE_API_KEY").ok()?;
    let secret = env::var("PROCURE_API_SECRET").ok()?;
    let doctype =
        env::var("PROCURE_DOCTYPE").unwrap_or_else(|_| "Purchase Requisition".to_string());

    let client = FrappeClient::builder()
        .url(url)
        .credentials(Credentials::api_token(key, secret))
        .build()
        .expect("invalid PROCURE_URL");
    Some((client, doctype))
}

#[tokio::test]
#[ignore = "requires a live backend configured in .env"]
async fn test_get_list_with_count() {
    let (client, doctype) = load_env().expect("Missing environment variables. See module docs.");

    let query = RemoteQuery::new(&doctype, ["name", "modified"]).paginate(0, 5);
    let page = client.get_list(&query).await.expect("list call failed");

    assert!(page.len() <= 5);
    assert!(page.total_count() >= page.len());
    for record in page.records() {
        assert!(record.name().is_some());
    }
}

#[tokio::test]
#[ignore = "requires a live backend configured in .env"]
async fn test_get_facet_values() {
    let (client, doctype) = load_env().expect("Missing environment variables. See module docs.");

    let query = FacetQuery {
        doctype,
        field: "status".to_string(),
        filters: Vec::new(),
    };
    let values = client.get_facet_values(&query).await.expect("facet call failed");
    assert!(values.iter().all(|v| !v.label().is_empty() || v.count > 0));
}

#[tokio::test]
#[ignore = "requires a live backend configured in .env"]
async fn test_table_against_backend() {
    let (client, doctype) = load_env().expect("Missing environment variables. See module docs.");

    let urls = UrlStateManager::in_memory("live_size=10");
    let config = TableConfig::new(doctype, "live", ["name", "modified"]);
    let table = ServerDataTable::new(config, Arc::new(client), urls).expect("table config");

    let model = table.settled().await.expect("table disposed");
    assert!(!model.has_error(), "fetch failed: {:?}", model.error);
    assert!(model.rows.len() <= 10);
}
