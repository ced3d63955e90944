//! Server-driven data tables.
//!
//! A [`ServerDataTable`] owns the paging, sorting, filtering and search state
//! of one table view, mirrors that state into the URL, and keeps a
//! [`TableModel`] in sync with the remote collection.
//!
//! State changes flow through one pipeline:
//!
//! 1. a setter mutates [`TableState`]
//! 2. the changed parameters are written to the [`UrlStateManager`](crate::url_state::UrlStateManager)
//! 3. a [`RemoteQuery`](crate::api::query::RemoteQuery) is derived with [`derive_query`]
//! 4. if it differs from the last one issued, it is fetched, immediately or
//!    after the search debounce window
//! 5. the response replaces the model, unless a newer query was issued meanwhile

mod config;
mod controller;
mod debounce;
mod model;
mod query;
mod state;
mod url;

pub use config::*;
pub use controller::*;
pub use debounce::*;
pub use model::*;
pub use query::*;
pub use state::*;
pub use self::url::UrlKeys;
pub use self::url::decode as decode_state;
pub use self::url::encode as encode_state;
