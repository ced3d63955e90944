//! Typed query building blocks.
//!
//! - [`Filter`] - `(field, operator, value)` conditions
//! - [`OrderBy`] - result ordering
//! - [`RemoteQuery`] / [`FacetQuery`] - complete requests for a list client
//! - [`Page`] - a page of results with the total match count

mod filter;
mod order;
mod page;
mod remote;

pub use filter::Filter;
pub use filter::FilterValue;
pub use filter::Operator;
pub use order::Direction;
pub use order::OrderBy;
pub use page::Page;
pub use remote::FacetQuery;
pub use remote::RemoteQuery;
