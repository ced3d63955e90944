//! Configuration error types
//!
//! These are programmer errors. They are raised when a table or client is
//! constructed, never while the table is running.

/// Errors raised by invalid table or client configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The list of fields to fetch is empty.
    #[error("Fields to fetch must not be empty")]
    EmptyFields,

    /// A column or searchable field is not part of the fields to fetch.
    #[error("Field '{field}' used by {used_by} is missing from the fields to fetch")]
    MissingField {
        /// The missing field.
        field: String,
        /// What referenced it (`"column"`, `"searchable field"`, `"default sort"`).
        used_by: &'static str,
    },

    /// More than one searchable field is marked as the default.
    #[error("At most one searchable field may be marked as default")]
    MultipleDefaultSearchFields,

    /// A page size of zero was configured.
    #[error("Page size must be positive")]
    InvalidPageSize,

    /// The default page size is not one of the offered page size options.
    #[error("Default page size {0} is not one of the page size options")]
    PageSizeNotOffered(usize),

    /// The URL sync key is empty.
    #[error("URL sync key must not be empty")]
    EmptyUrlSyncKey,

    /// Another mounted table already owns this URL sync key.
    #[error("URL sync key '{0}' is already claimed by another table")]
    DuplicateUrlSyncKey(String),

    /// The controller was constructed outside of a tokio runtime.
    #[error("Table controller requires a running tokio runtime")]
    NoRuntime,

    /// Facet values were requested for a column that does not enable facets.
    #[error("Field '{0}' is not a facet-enabled column")]
    FieldNotFacetable(String),

    /// A search field was selected that is not configured as searchable.
    #[error("Field '{0}' is not a searchable field")]
    UnknownSearchField(String),

    /// A `json-contains` filter was configured outside the search box.
    #[error("Field '{0}' uses json-contains outside the search box; JSON fields are only searchable")]
    JsonFilterOutsideSearch(String),

    /// A query carries more than one `json-contains` predicate. The backend
    /// accepts a single JSON search per request.
    #[error("At most one json-contains predicate may be sent per request")]
    MultipleJsonSearches,

    /// The backend URL could not be parsed.
    #[error("Invalid backend URL: {0}")]
    InvalidBaseUrl(String),
}
