//! Table configuration

use std::sync::Arc;
use std::time::Duration;

use crate::api::query::Direction;
use crate::api::query::Filter;
use crate::api::query::OrderBy;
use crate::counts::DocCountStore;
use crate::error::ConfigError;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default page size choices offered to the user.
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Default delay between the last search keystroke and the fetch.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// A column as far as the controller cares: which field it shows, how it
/// sorts by default and whether it offers a facet filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// The field rendered by the column.
    pub field: String,
    /// Direction used when the user first sorts by this column.
    pub default_sort: Option<Direction>,
    /// Whether distinct values of this column can be fetched for a filter dropdown.
    pub facet: bool,
}

impl ColumnDef {
    /// Creates a plain column.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            default_sort: None,
            facet: false,
        }
    }

    /// Sets the column's default sort direction.
    pub fn with_default_sort(mut self, direction: Direction) -> Self {
        self.default_sort = Some(direction);
        self
    }

    /// Enables facet value fetching for the column.
    pub fn with_facet(mut self) -> Self {
        self.facet = true;
        self
    }
}

/// A field the user can pick in the search box's field selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchField {
    /// The field searched.
    pub field: String,
    /// Label shown to the user.
    pub label: String,
    /// Selected when nothing else is.
    pub is_default: bool,
    /// The field holds structured JSON; search uses the backend's JSON predicate.
    pub is_json: bool,
}

impl SearchField {
    /// Creates a plain-text search field.
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            is_default: false,
            is_json: false,
        }
    }

    /// Marks this field as the default search field.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Marks this field as a structured JSON field.
    pub fn json(mut self) -> Self {
        self.is_json = true;
        self
    }
}

/// Everything a [`ServerDataTable`](super::ServerDataTable) needs to know
/// about the collection it shows.
///
/// # Example
///
/// ```
/// use procure_lib::api::query::{Filter, OrderBy};
/// use procure_lib::table::{SearchField, TableConfig};
///
/// let config = TableConfig::new(
///     "Procurement Requests",
///     "pr_new",
///     ["name", "project", "workflow_state", "order_list", "creation"],
/// )
/// .with_static_filter(Filter::eq("workflow_state", "Pending"))
/// .with_search_field(SearchField::new("name", "PR ID").as_default())
/// .with_search_field(SearchField::new("order_list", "Item").json())
/// .with_default_sort(OrderBy::desc("creation"));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The remote collection (DocType) name.
    pub resource: String,
    /// Prefix of every URL parameter this table owns.
    pub url_sync_key: String,
    /// Fields fetched for each row.
    pub fields: Vec<String>,
    /// Column descriptors.
    pub columns: Vec<ColumnDef>,
    /// Fields offered in the search box.
    pub searchable_fields: Vec<SearchField>,
    /// Filters applied regardless of user input.
    pub static_filters: Vec<Filter>,
    /// Ordering used when the URL does not specify one.
    pub default_sort: Option<OrderBy>,
    /// Whether rows can be selected.
    pub enable_row_selection: bool,
    /// Initial page size.
    pub page_size: usize,
    /// Page sizes the user may pick. Empty allows any positive size.
    pub page_size_options: Vec<usize>,
    /// Quiet period before a search term change is fetched.
    pub search_debounce: Duration,
    /// Where to publish the total count of each successful fetch.
    pub count_store: Option<Arc<DocCountStore>>,
}

impl TableConfig {
    /// Creates a configuration with default paging and no filters, search or columns.
    pub fn new(
        resource: impl Into<String>,
        url_sync_key: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            resource: resource.into(),
            url_sync_key: url_sync_key.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            columns: Vec::new(),
            searchable_fields: Vec::new(),
            static_filters: Vec::new(),
            default_sort: None,
            enable_row_selection: false,
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            count_store: None,
        }
    }

    /// Adds a column.
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds several columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Adds a searchable field.
    pub fn with_search_field(mut self, field: SearchField) -> Self {
        self.searchable_fields.push(field);
        self
    }

    /// Adds a static filter.
    pub fn with_static_filter(mut self, filter: Filter) -> Self {
        self.static_filters.push(filter);
        self
    }

    /// Replaces the static filters.
    pub fn with_static_filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.static_filters = filters.into_iter().collect();
        self
    }

    /// Sets the default ordering.
    pub fn with_default_sort(mut self, order: OrderBy) -> Self {
        self.default_sort = Some(order);
        self
    }

    /// Enables row selection.
    pub fn with_row_selection(mut self) -> Self {
        self.enable_row_selection = true;
        self
    }

    /// Sets the initial page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the page sizes offered to the user.
    pub fn with_page_size_options(mut self, options: impl IntoIterator<Item = usize>) -> Self {
        self.page_size_options = options.into_iter().collect();
        self
    }

    /// Sets the search debounce window.
    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    /// Publishes total counts to a shared store.
    pub fn with_count_store(mut self, store: Arc<DocCountStore>) -> Self {
        self.count_store = Some(store);
        self
    }

    /// Checks every construction-time precondition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url_sync_key.trim().is_empty() {
            return Err(ConfigError::EmptyUrlSyncKey);
        }
        if self.fields.is_empty() {
            return Err(ConfigError::EmptyFields);
        }

        let fetched = |field: &str| self.fields.iter().any(|f| f == field);
        for column in &self.columns {
            if !fetched(&column.field) {
                return Err(ConfigError::MissingField {
                    field: column.field.clone(),
                    used_by: "column",
                });
            }
        }
        for search in &self.searchable_fields {
            if !fetched(&search.field) {
                return Err(ConfigError::MissingField {
                    field: search.field.clone(),
                    used_by: "searchable field",
                });
            }
        }
        if let Some(filter) = self.static_filters.iter().find(|f| f.is_json_search()) {
            return Err(ConfigError::JsonFilterOutsideSearch(filter.field.clone()));
        }
        if self.searchable_fields.iter().filter(|s| s.is_default).count() > 1 {
            return Err(ConfigError::MultipleDefaultSearchFields);
        }

        if self.page_size == 0 || self.page_size_options.contains(&0) {
            return Err(ConfigError::InvalidPageSize);
        }
        if !self.page_size_options.is_empty() && !self.page_size_options.contains(&self.page_size) {
            return Err(ConfigError::PageSizeNotOffered(self.page_size));
        }
        Ok(())
    }

    /// The ordering used when nothing else is requested: the explicit default
    /// sort, else the first column that declares a default direction.
    pub fn resolved_default_sort(&self) -> Option<OrderBy> {
        self.default_sort.clone().or_else(|| {
            self.columns.iter().find_map(|c| {
                c.default_sort
                    .map(|direction| OrderBy::new(c.field.clone(), direction))
            })
        })
    }

    /// The search field selected when the user has not picked one: the one
    /// marked default, else the first.
    pub fn default_search_field(&self) -> Option<&SearchField> {
        self.searchable_fields
            .iter()
            .find(|s| s.is_default)
            .or_else(|| self.searchable_fields.first())
    }

    /// Looks up a searchable field by name.
    pub fn search_field(&self, field: &str) -> Option<&SearchField> {
        self.searchable_fields.iter().find(|s| s.field == field)
    }

    /// Looks up a column by field.
    pub fn column(&self, field: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Returns `true` if `size` may be selected as a page size.
    pub fn accepts_page_size(&self, size: usize) -> bool {
        size > 0 && (self.page_size_options.is_empty() || self.page_size_options.contains(&size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TableConfig {
        TableConfig::new("Procurement Orders", "po", ["name", "vendor", "project", "order_list"])
    }

    #[test]
    fn test_valid_minimal() {
        assert_eq!(base().validate(), Ok(()));
    }

    #[test]
    fn test_empty_fields() {
        let config = TableConfig::new("Procurement Orders", "po", Vec::<String>::new());
        assert_eq!(config.validate(), Err(ConfigError::EmptyFields));
    }

    #[test]
    fn test_empty_url_sync_key() {
        let config = TableConfig::new("Procurement Orders", "", ["name"]);
        assert_eq!(config.validate(), Err(ConfigError::EmptyUrlSyncKey));
    }

    #[test]
    fn test_column_field_must_be_fetched() {
        let config = base().with_column(ColumnDef::new("total_amount"));
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField {
                field: "total_amount".to_string(),
                used_by: "column",
            })
        );
    }

    #[test]
    fn test_search_field_must_be_fetched() {
        let config = base().with_search_field(SearchField::new("item_name", "Item"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { used_by: "searchable field", .. })
        ));
    }

    #[test]
    fn test_single_default_search_field() {
        let config = base()
            .with_search_field(SearchField::new("name", "ID").as_default())
            .with_search_field(SearchField::new("vendor", "Vendor").as_default());
        assert_eq!(config.validate(), Err(ConfigError::MultipleDefaultSearchFields));
    }

    #[test]
    fn test_static_json_filter_rejected() {
        let config = base().with_static_filter(Filter::json_contains("order_list", "cement"));
        assert_eq!(
            config.validate(),
            Err(ConfigError::JsonFilterOutsideSearch("order_list".to_string()))
        );
    }

    #[test]
    fn test_page_size_rules() {
        assert_eq!(base().with_page_size(0).validate(), Err(ConfigError::InvalidPageSize));
        assert_eq!(
            base().with_page_size(30).validate(),
            Err(ConfigError::PageSizeNotOffered(30))
        );
        assert_eq!(
            base()
                .with_page_size(30)
                .with_page_size_options(Vec::new())
                .validate(),
            Ok(())
        );
    }

    #[test]
    fn test_default_search_field_falls_back_to_first() {
        let config = base()
            .with_search_field(SearchField::new("name", "ID"))
            .with_search_field(SearchField::new("vendor", "Vendor"));
        assert_eq!(config.default_search_field().unwrap().field, "name");

        let config = config.with_search_field(SearchField::new("project", "Project").as_default());
        assert_eq!(config.default_search_field().unwrap().field, "project");
    }

    #[test]
    fn test_resolved_default_sort() {
        let config = base()
            .with_column(ColumnDef::new("name"))
            .with_column(ColumnDef::new("vendor").with_default_sort(Direction::Asc));
        assert_eq!(config.resolved_default_sort(), Some(OrderBy::asc("vendor")));

        let config = config.with_default_sort(OrderBy::desc("creation"));
        assert_eq!(config.resolved_default_sort(), Some(OrderBy::desc("creation")));
        assert_eq!(base().resolved_default_sort(), None);
    }
}
