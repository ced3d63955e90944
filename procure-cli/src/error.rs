//! Error types for the command line tool

use std::sync::Arc;

use procure_lib::error::ConfigError;
use procure_lib::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid filter {0:?}: expected field:op:value or field=value")]
    InvalidFilter(String),

    #[error("Unknown operator {op:?} in filter {filter:?}")]
    UnknownOperator { filter: String, op: String },

    #[error("Filter {0:?} uses json-contains; search JSON fields with --search-field and --search")]
    JsonFilter(String),

    #[error("Invalid sort {0:?}: expected field:asc or field:desc")]
    InvalidSort(String),

    #[error("Page numbers start at 1")]
    InvalidPage,

    #[error("Missing {0}")]
    MissingSetting(&'static str),

    #[error("Request failed: {0}")]
    Fetch(Arc<Error>),

    #[error(transparent)]
    Lib(#[from] Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
