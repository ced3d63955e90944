//! Filter types for list queries.

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;

/// Comparison operator of a filter triple.
///
/// Serialises to the exact operator strings the backend's query language
/// accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// SQL `like` with `%` wildcards.
    #[serde(rename = "like")]
    Like,
    /// SQL `not like`.
    #[serde(rename = "not like")]
    NotLike,
    /// Value is one of a list.
    #[serde(rename = "in")]
    In,
    /// Value is none of a list.
    #[serde(rename = "not in")]
    NotIn,
    /// Inclusive range, value is a two element list.
    #[serde(rename = "between")]
    Between,
    /// `is set` / `is not set`.
    #[serde(rename = "is")]
    Is,
    /// Substring match inside a structured (JSON) field.
    ///
    /// The backend evaluates this itself; the client only flags it.
    #[serde(rename = "json-contains")]
    JsonContains,
}

impl Operator {
    /// Returns the operator as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Between => "between",
            Operator::Is => "is",
            Operator::JsonContains => "json-contains",
        }
    }

    /// Parses an operator from its wire form.
    pub fn parse(s: &str) -> Option<Self> {
        let op = match s.trim() {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "like" => Operator::Like,
            "not like" => Operator::NotLike,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "between" => Operator::Between,
            "is" => Operator::Is,
            "json-contains" => Operator::JsonContains,
            _ => return None,
        };
        Some(op)
    }

    /// Returns `true` if the operator takes a list of values.
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn | Operator::Between)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a filter triple.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A single scalar value.
    Single(Value),
    /// A list of values (`in`, `not in`, `between`).
    List(Vec<Value>),
}

impl FilterValue {
    /// Converts the value into its JSON wire form.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Single(v) => v.clone(),
            FilterValue::List(values) => Value::Array(values.clone()),
        }
    }

    /// Returns the scalar value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::Single(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// A `(field, operator, value)` filter condition.
///
/// A list of filters is always combined with logical AND by the backend.
///
/// # Example
///
/// ```
/// use procure_lib::api::query::Filter;
///
/// let approved = Filter::eq("workflow_state", "Approved");
/// let projects = Filter::in_list("project", ["PROJ-001", "PROJ-002"]);
/// let search = Filter::contains("vendor_name", "steel");
///
/// assert_eq!(search.value.as_str(), Some("%steel%"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// The field being filtered.
    pub field: String,
    /// The comparison operator.
    pub operator: Operator,
    /// The comparison value.
    pub value: FilterValue,
}

impl Filter {
    /// Creates a filter from its three parts.
    pub fn new(field: impl Into<String>, operator: Operator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    fn single(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(field, operator, FilterValue::Single(value.into()))
    }

    /// Creates an equality filter: `field = value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(field, Operator::Eq, value)
    }

    /// Creates a not-equal filter: `field != value`.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(field, Operator::Ne, value)
    }

    /// Creates a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(field, Operator::Gt, value)
    }

    /// Creates a greater-than-or-equal filter.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(field, Operator::Ge, value)
    }

    /// Creates a less-than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(field, Operator::Lt, value)
    }

    /// Creates a less-than-or-equal filter.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(field, Operator::Le, value)
    }

    /// Creates a `like` filter with a caller-supplied pattern.
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::single(field, Operator::Like, pattern.into())
    }

    /// Creates a substring filter: `field like '%value%'`.
    pub fn contains(field: impl Into<String>, value: impl AsRef<str>) -> Self {
        Self::like(field, format!("%{}%", value.as_ref()))
    }

    /// Creates an `in` filter.
    pub fn in_list<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            field,
            Operator::In,
            FilterValue::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Creates a `not in` filter.
    pub fn not_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            field,
            Operator::NotIn,
            FilterValue::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Creates an inclusive range filter.
    pub fn between(field: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self::new(
            field,
            Operator::Between,
            FilterValue::List(vec![from.into(), to.into()]),
        )
    }

    /// Creates an `is set` filter.
    pub fn is_set(field: impl Into<String>) -> Self {
        Self::single(field, Operator::Is, "set")
    }

    /// Creates an `is not set` filter.
    pub fn is_not_set(field: impl Into<String>) -> Self {
        Self::single(field, Operator::Is, "not set")
    }

    /// Creates a JSON-field search predicate.
    ///
    /// The term is passed through untouched; matching happens in the backend.
    pub fn json_contains(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self::single(field, Operator::JsonContains, term.into())
    }

    /// Returns `true` if this is a JSON-field search predicate.
    pub fn is_json_search(&self) -> bool {
        self.operator == Operator::JsonContains
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.field, self.operator, self.value.to_json()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (field, operator, value) = <(String, Operator, Value)>::deserialize(deserializer)?;
        let value = match value {
            Value::Array(values) if operator.takes_list() => FilterValue::List(values),
            other => FilterValue::Single(other),
        };
        Ok(Filter {
            field,
            operator,
            value,
        })
    }
}
