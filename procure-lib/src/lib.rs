//! Procurement table library
//!
//! Server-driven data tables for a Frappe-style backend: URL-synchronized
//! paging, sorting, filtering and debounced search, with a typed async
//! client for the list/count and facet endpoints.

pub mod api;
pub mod counts;
pub mod error;
pub mod model;
pub mod table;
pub mod url_state;

mod client;

pub use client::*;
