//! Error types

mod api;
mod config;

pub use api::*;
pub use config::*;

/// Top-level error type for the procurement table library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote list/count backend failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A table or client was configured incorrectly.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A JSON payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The controller was disposed before the operation completed.
    #[error("Table controller has been disposed")]
    Disposed,
}

impl Error {
    /// Returns the underlying API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if this is a configuration (programmer) error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
