//! Mirroring [`TableState`] into namespaced URL parameters.
//!
//! Every parameter is optional. A value equal to the configured default is
//! written as absent, and an absent or malformed value decodes to the
//! default, so a URL only carries what differs from a fresh table.

use super::TableConfig;
use super::TableState;
use crate::api::query::Direction;
use crate::api::query::Filter;
use crate::api::query::OrderBy;
use crate::url_state::UrlStateManager;

/// The URL parameter names owned by one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlKeys {
    /// One-based page number.
    pub page: String,
    /// Page size.
    pub page_size: String,
    /// `field:direction`.
    pub sort: String,
    /// JSON list of filter triples.
    pub filters: String,
    /// Selected search field.
    pub search_field: String,
    /// Search term.
    pub search: String,
}

impl UrlKeys {
    /// Derives the parameter names for a URL sync key.
    pub fn new(url_sync_key: &str) -> Self {
        Self {
            page: format!("{}_page", url_sync_key),
            page_size: format!("{}_size", url_sync_key),
            sort: format!("{}_sort", url_sync_key),
            filters: format!("{}_filters", url_sync_key),
            search_field: format!("{}_search_field", url_sync_key),
            search: format!("{}_q", url_sync_key),
        }
    }

    /// All parameter names, in a fixed order.
    pub fn all(&self) -> [&str; 6] {
        [
            &self.page,
            &self.page_size,
            &self.sort,
            &self.filters,
            &self.search_field,
            &self.search,
        ]
    }
}

/// Renders the URL parameters for a state. `None` means "remove".
pub fn encode(state: &TableState, config: &TableConfig, keys: &UrlKeys) -> Vec<(String, Option<String>)> {
    let page = (state.page_index > 0).then(|| state.page_index.saturating_add(1).to_string());

    let page_size = (state.page_size != config.page_size).then(|| state.page_size.to_string());

    let sort = if state.sort == config.resolved_default_sort() {
        None
    } else {
        // an explicitly cleared sort on a table with a default is not representable
        state
            .sort
            .as_ref()
            .map(|o| format!("{}:{}", o.field, o.direction))
    };

    let filters = if state.column_filters.is_empty() {
        None
    } else {
        serde_json::to_string(&state.column_filters).ok()
    };

    let default_field = config.default_search_field().map(|s| s.field.as_str());
    let search_field = match state.search_field.as_deref() {
        Some(field) if Some(field) != default_field => Some(field.to_string()),
        _ => None,
    };

    let search = (!state.search_term.is_empty()).then(|| state.search_term.clone());

    vec![
        (keys.page.clone(), page),
        (keys.page_size.clone(), page_size),
        (keys.sort.clone(), sort),
        (keys.filters.clone(), filters),
        (keys.search_field.clone(), search_field),
        (keys.search.clone(), search),
    ]
}

/// Reads a state back from the URL. Row selection is never stored in the
/// URL and comes back empty.
pub fn decode(urls: &UrlStateManager, config: &TableConfig, keys: &UrlKeys) -> TableState {
    let mut state = TableState::initial(config);

    if let Some(raw) = urls.get_param(&keys.page) {
        match raw.trim().parse::<usize>() {
            Ok(page) if page >= 1 => state.page_index = page - 1,
            _ => log::warn!("Ignoring malformed URL param {}={:?}", keys.page, raw),
        }
    }

    if let Some(raw) = urls.get_param(&keys.page_size) {
        match raw.trim().parse::<usize>() {
            Ok(size) if config.accepts_page_size(size) => state.page_size = size,
            _ => log::warn!("Ignoring malformed URL param {}={:?}", keys.page_size, raw),
        }
    }

    if let Some(raw) = urls.get_param(&keys.sort) {
        match parse_sort(&raw) {
            Some(order) => state.sort = Some(order),
            None => log::warn!("Ignoring malformed URL param {}={:?}", keys.sort, raw),
        }
    }

    if let Some(raw) = urls.get_param(&keys.filters) {
        match serde_json::from_str::<Vec<Filter>>(&raw) {
            Ok(filters) => {
                // same rule as the setters: the last filter per field wins
                for filter in filters {
                    if filter.is_json_search() {
                        log::warn!("Ignoring json-contains filter on {} in {}", filter.field, keys.filters);
                        continue;
                    }
                    state.upsert_filter(filter);
                }
            }
            Err(e) => log::warn!("Ignoring malformed URL param {}: {}", keys.filters, e),
        }
    }

    if let Some(raw) = urls.get_param(&keys.search_field) {
        if config.search_field(&raw).is_some() {
            state.search_field = Some(raw);
        } else {
            log::warn!("Ignoring unknown search field {}={:?}", keys.search_field, raw);
        }
    }

    if let Some(term) = urls.get_param(&keys.search) {
        state.search_term = term;
    }

    state
}

fn parse_sort(raw: &str) -> Option<OrderBy> {
    let (field, direction) = raw.rsplit_once(':')?;
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    Some(OrderBy::new(field, Direction::parse(direction.trim())?))
}

/// Writes a state's parameters in one address bar update.
pub(crate) fn write(urls: &UrlStateManager, params: &[(String, Option<String>)]) {
    let changes: Vec<(&str, Option<&str>)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_deref()))
        .collect();
    urls.update_params(&changes);
}
