//! HTTP client for the document backend

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::RequestBuilder;
use url::Url;

use crate::error::ConfigError;
use crate::error::Error;

/// Default whitelisted method returning a page of records plus a total count.
pub const DEFAULT_LIST_METHOD: &str = "procure.api.data_table.get_list_with_count";

/// Default whitelisted method returning distinct values of one field.
pub const DEFAULT_FACET_METHOD: &str = "procure.api.data_table.get_facet_values";

/// How requests authenticate against the backend.
#[derive(Clone)]
pub enum Credentials {
    /// API key and secret, sent as `Authorization: token key:secret`.
    ApiToken {
        /// The API key.
        key: String,
        /// The API secret.
        secret: String,
    },
    /// An OAuth bearer token.
    Bearer(String),
    /// No authentication (e.g. a session cookie is handled elsewhere).
    None,
}

impl Credentials {
    /// Creates API key/secret credentials.
    pub fn api_token(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::ApiToken {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::ApiToken { key, secret } => {
                request.header(reqwest::header::AUTHORIZATION, format!("token {}:{}", key, secret))
            }
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::None => request,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiToken { key, .. } => f
                .debug_struct("ApiToken")
                .field("key", key)
                .field("secret", &"***")
                .finish(),
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
            Credentials::None => f.write_str("None"),
        }
    }
}

/// Client for the backend's generic list/count RPC API.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tables and threads.
///
/// # Example
///
/// ```ignore
/// use procure_lib::{Credentials, FrappeClient};
///
/// let client = FrappeClient::builder()
///     .url("https://erp.example.com")
///     .credentials(Credentials::api_token("key", "secret"))
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct FrappeClient {
    pub(crate) inner: Arc<FrappeClientInner>,
}

pub(crate) struct FrappeClientInner {
    pub(crate) base_url: String,
    pub(crate) credentials: Credentials,
    pub(crate) http_client: Client,
    pub(crate) timeout: Option<Duration>,
    pub(crate) list_method: String,
    pub(crate) facet_method: String,
}

impl FrappeClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> FrappeClientBuilder<Missing, Missing> {
        FrappeClientBuilder::new()
    }

    /// Returns the base URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the URL of a whitelisted method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.inner.base_url.trim_end_matches('/'), method)
    }
}

impl std::fmt::Debug for FrappeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrappeClient")
            .field("base_url", &self.inner.base_url)
            .field("credentials", &self.inner.credentials)
            .field("list_method", &self.inner.list_method)
            .field("facet_method", &self.inner.facet_method)
            .finish()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`FrappeClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The backend URL
/// - `credentials` - How to authenticate
pub struct FrappeClientBuilder<U, C> {
    url: U,
    credentials: C,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
    list_method: String,
    facet_method: String,
}

impl FrappeClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            credentials: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
            list_method: DEFAULT_LIST_METHOD.to_string(),
            facet_method: DEFAULT_FACET_METHOD.to_string(),
        }
    }
}

impl Default for FrappeClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> FrappeClientBuilder<Missing, C> {
    /// Sets the backend URL.
    pub fn url(self, url: impl Into<String>) -> FrappeClientBuilder<Set<String>, C> {
        FrappeClientBuilder {
            url: Set(url.into()),
            credentials: self.credentials,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            list_method: self.list_method,
            facet_method: self.facet_method,
        }
    }
}

impl<U> FrappeClientBuilder<U, Missing> {
    /// Sets the credentials used for every request.
    pub fn credentials(self, credentials: Credentials) -> FrappeClientBuilder<U, Set<Credentials>> {
        FrappeClientBuilder {
            url: self.url,
            credentials: Set(credentials),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            list_method: self.list_method,
            facet_method: self.facet_method,
        }
    }
}

impl<U, C> FrappeClientBuilder<U, C> {
    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Overrides the method used for list/count requests.
    pub fn list_method(mut self, method: impl Into<String>) -> Self {
        self.list_method = method.into();
        self
    }

    /// Overrides the method used for facet requests.
    pub fn facet_method(mut self, method: impl Into<String>) -> Self {
        self.facet_method = method.into();
        self
    }
}

impl FrappeClientBuilder<Set<String>, Set<Credentials>> {
    /// Builds the [`FrappeClient`].
    ///
    /// Fails if the URL is not an absolute http(s) URL or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<FrappeClient, Error> {
        let base_url = self.url.0;
        match Url::parse(&base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidBaseUrl(base_url).into()),
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build().map_err(crate::error::ApiError::from)?
            }
        };

        Ok(FrappeClient {
            inner: Arc::new(FrappeClientInner {
                base_url,
                credentials: self.credentials.0,
                http_client,
                timeout: self.timeout,
                list_method: self.list_method,
                facet_method: self.facet_method,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_relative_url() {
        let result = FrappeClient::builder()
            .url("erp.example.com")
            .credentials(Credentials::None)
            .build();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidBaseUrl(_)))
        ));
    }

    #[test]
    fn test_method_url() {
        let client = FrappeClient::builder()
            .url("https://erp.example.com/")
            .credentials(Credentials::api_token("k", "s"))
            .build()
            .unwrap();
        assert_eq!(
            client.method_url(DEFAULT_LIST_METHOD),
            "https://erp.example.com/api/method/procure.api.data_table.get_list_with_count"
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", Credentials::api_token("key", "hunter2"));
        assert!(debug.contains("key"));
        assert!(!debug.contains("hunter2"));
    }
}
