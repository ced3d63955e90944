//! Deriving remote queries from table state.
//!
//! Pure functions: the same config and state always produce equal queries.

use super::TableConfig;
use super::TableState;
use crate::api::query::FacetQuery;
use crate::api::query::Filter;
use crate::api::query::RemoteQuery;

/// Builds the search predicate for the state's search term, if there is one.
///
/// JSON fields get the backend's JSON predicate, everything else a
/// substring match.
pub fn search_filter(config: &TableConfig, state: &TableState) -> Option<Filter> {
    let term = state.search_term.trim();
    if term.is_empty() {
        return None;
    }
    let field = match state.search_field.as_deref() {
        Some(name) => config.search_field(name),
        None => config.default_search_field(),
    }?;

    Some(if field.is_json {
        Filter::json_contains(field.field.clone(), term)
    } else {
        Filter::contains(field.field.clone(), term)
    })
}

/// Static filters, then user filters, then the search predicate.
fn combined_filters(config: &TableConfig, state: &TableState, skip_field: Option<&str>) -> Vec<Filter> {
    config
        .static_filters
        .iter()
        .cloned()
        .chain(
            state
                .column_filters
                .iter()
                .filter(|f| Some(f.field.as_str()) != skip_field)
                .cloned(),
        )
        .chain(search_filter(config, state))
        .collect()
}

/// The query for the state's current page.
pub fn derive_query(config: &TableConfig, state: &TableState) -> RemoteQuery {
    RemoteQuery {
        doctype: config.resource.clone(),
        fields: config.fields.clone(),
        filters: combined_filters(config, state, None),
        order_by: state.sort.clone(),
        limit: Some(state.page_size),
        offset: state.offset(),
    }
}

/// The current filters and ordering without pagination, for exports.
pub fn export_query(config: &TableConfig, state: &TableState) -> RemoteQuery {
    RemoteQuery {
        limit: None,
        offset: 0,
        ..derive_query(config, state)
    }
}

/// Distinct values of `field` under every active filter except the user's
/// own filter on that field, so a facet dropdown still lists the
/// alternatives to the current selection.
pub fn facet_query(config: &TableConfig, state: &TableState, field: &str) -> FacetQuery {
    FacetQuery {
        doctype: config.resource.clone(),
        field: field.to_string(),
        filters: combined_filters(config, state, Some(field)),
    }
}
