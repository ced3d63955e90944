//! Record models

mod facet;
mod record;

pub use facet::*;
pub use record::*;
