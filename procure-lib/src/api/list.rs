//! The list/count client contract and its HTTP implementation

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::query::FacetQuery;
use super::query::Page;
use super::query::RemoteQuery;
use super::wire;
use crate::FrappeClient;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::FacetValue;

/// Anything that can answer list and facet queries.
///
/// Implementations may fail; the table controller surfaces failures as-is and
/// never retries. Timeouts, if any, are the implementation's business.
#[async_trait]
pub trait ListClient: Send + Sync {
    /// Returns one page of records plus the total match count.
    async fn get_list(&self, query: &RemoteQuery) -> Result<Page, Error>;

    /// Returns the distinct values of a field under the query's filters.
    async fn get_facet_values(&self, query: &FacetQuery) -> Result<Vec<FacetValue>, Error>;
}

#[async_trait]
impl ListClient for FrappeClient {
    async fn get_list(&self, query: &RemoteQuery) -> Result<Page, Error> {
        let body = wire::list_body(query)?;
        let message: wire::ListMessage = self.call_method(&self.inner.list_method, &body).await?;
        Ok(Page::new(message.data, message.total_count))
    }

    async fn get_facet_values(&self, query: &FacetQuery) -> Result<Vec<FacetValue>, Error> {
        let body = wire::facet_body(query)?;
        self.call_method(&self.inner.facet_method, &body).await
    }
}

impl FrappeClient {
    /// Calls a whitelisted method with a JSON body and decodes its `message`.
    pub async fn call_method<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, Error> {
        let url = self.method_url(method);
        log::debug!("POST {}", url);

        let mut request = self
            .inner
            .http_client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);
        request = self.inner.credentials.apply(request);

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::from)?;

        if !status.is_success() {
            return Err(wire::decode_error(status.as_u16(), &text).into());
        }

        Ok(wire::decode_message(&text)?)
    }

    fn map_send_error(&self, error: reqwest::Error) -> Error {
        match self.inner.timeout {
            Some(timeout) if error.is_timeout() => ApiError::Timeout(timeout).into(),
            _ => ApiError::Network(error).into(),
        }
    }
}
