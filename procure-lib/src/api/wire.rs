//! Request bodies and response decoding for the list/count RPC methods.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::api::query::FacetQuery;
use crate::api::query::Filter;
use crate::api::query::RemoteQuery;
use crate::error::ApiError;
use crate::error::ConfigError;
use crate::model::Record;

/// Builds the JSON body of a list/count request.
///
/// JSON-field search predicates are not sent as filter triples. The backend
/// expects them as `search_term` + `current_search_field` + `is_json`, so a
/// query may carry at most one.
pub(crate) fn list_body(query: &RemoteQuery) -> Result<Value, ConfigError> {
    let filters: Vec<&Filter> = query.plain_filters().collect();
    let mut body = json!({
        "doctype": query.doctype,
        "fields": query.fields,
        "filters": filters,
        "order_by": query.order_by.as_ref().map(|o| o.to_string()),
        "limit_start": query.offset,
        // 0 asks the backend for every record
        "limit_page_length": query.limit.unwrap_or(0),
    });
    if let Value::Object(map) = &mut body {
        apply_json_search(map, &query.filters)?;
    }
    Ok(body)
}

/// Builds the JSON body of a facet request.
pub(crate) fn facet_body(query: &FacetQuery) -> Result<Value, ConfigError> {
    let filters: Vec<&Filter> = query.plain_filters().collect();
    let mut body = json!({
        "doctype": query.doctype,
        "field": query.field,
        "filters": filters,
    });
    if let Value::Object(map) = &mut body {
        apply_json_search(map, &query.filters)?;
    }
    Ok(body)
}

fn apply_json_search(body: &mut Map<String, Value>, filters: &[Filter]) -> Result<(), ConfigError> {
    let mut searches = filters.iter().filter(|f| f.is_json_search());
    let Some(search) = searches.next() else {
        return Ok(());
    };
    if searches.next().is_some() {
        return Err(ConfigError::MultipleJsonSearches);
    }
    body.insert("search_term".to_string(), search.value.to_json());
    body.insert(
        "current_search_field".to_string(),
        Value::String(search.field.clone()),
    );
    body.insert("is_json".to_string(), Value::Bool(true));
    Ok(())
}

/// Envelope every whitelisted method answers with.
#[derive(Debug, Deserialize)]
struct MethodResponse<T> {
    message: T,
}

/// Payload of the list/count method.
#[derive(Debug, Deserialize)]
pub(crate) struct ListMessage {
    pub(crate) data: Vec<Record>,
    pub(crate) total_count: usize,
}

/// Decodes the `{"message": ...}` envelope of a successful response.
pub(crate) fn decode_message<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str::<MethodResponse<T>>(body)
        .map(|r| r.message)
        .map_err(|e| ApiError::parse_with_body(e.to_string(), body))
}

/// Error payload of a failed request.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    exc_type: Option<String>,
    exception: Option<String>,
    #[serde(rename = "_server_messages")]
    server_messages: Option<String>,
    message: Option<Value>,
}

/// Turns a non-success response into an [`ApiError::Http`].
///
/// The most specific human-readable message wins: the first server message,
/// then the exception text, then a string `message`, then the raw body.
pub(crate) fn decode_error(status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let message = parsed
        .server_messages
        .as_deref()
        .and_then(first_server_message)
        .or(parsed.exception)
        .or_else(|| match parsed.message {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| body.trim().to_string());

    ApiError::Http {
        status,
        message,
        exc_type: parsed.exc_type,
    }
}

/// `_server_messages` is a JSON string holding a list of JSON strings.
fn first_server_message(raw: &str) -> Option<String> {
    let messages: Vec<String> = serde_json::from_str(raw).ok()?;
    let first = messages.into_iter().next()?;
    match serde_json::from_str::<Value>(&first) {
        Ok(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => Some(first),
    }
}
