//! Query types and the list/count client contract

mod list;
pub mod query;
mod wire;

pub use list::*;
