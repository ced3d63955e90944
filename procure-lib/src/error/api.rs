//! API error types

use std::time::Duration;

/// Errors that can occur while talking to the remote list/count backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP error response from the backend.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Backend exception type (e.g. `frappe.exceptions.PermissionError`), if reported.
        exc_type: Option<String>,
    },

    /// The backend could not be reached or the connection broke.
    #[error("Could not reach the backend: {0}")]
    Network(#[from] reqwest::Error),

    /// No response within the client's timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The response was not the `{"message": ...}` envelope expected.
    #[error("Malformed backend response: {message}")]
    Parse {
        /// What the decoder tripped over.
        message: String,
        /// The undecodable body, kept for logging.
        body: Option<String>,
    },
}

impl ApiError {
    /// Creates an HTTP error without an exception type.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            exc_type: None,
        }
    }

    /// Creates a new HTTP error carrying the backend exception type.
    pub fn http_with_exc(status: u16, message: impl Into<String>, exc_type: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            exc_type: Some(exc_type.into()),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a parse error that keeps the offending body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// The HTTP status, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the backend exception type if available.
    pub fn exc_type(&self) -> Option<&str> {
        match self {
            Self::Http { exc_type, .. } => exc_type.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if repeating the same request could plausibly succeed.
    ///
    /// Nothing in this crate retries on its own; callers decide whether to
    /// offer a manual refetch.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Network(_) => true,
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}
