//! Dynamic document record

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// A single document returned by the list API.
///
/// Records are opaque JSON objects keyed by field name. The table layer never
/// interprets them beyond the `name` field, which the backend uses as the
/// document identifier.
///
/// # Example
///
/// ```
/// use procure_lib::model::Record;
///
/// let record = Record::new()
///     .set("name", "PR-0001")
///     .set("project", "PROJ-001");
///
/// assert_eq!(record.name(), Some("PR-0001"));
/// assert_eq!(record.get_str("project"), Some("PROJ-001"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Sets a field value, returning the record for chaining.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns the document identifier (`name`), if present.
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    /// Returns a reference to the raw field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a string field. Non-string values yield `None`.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Returns an integer field. Non-integer values yield `None`.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    /// Returns a numeric field as a float.
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    /// Returns a boolean field.
    ///
    /// The backend stores checkboxes as `0`/`1`, so integers are accepted too.
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        match self.fields.get(field)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }

    /// Returns a structured (JSON) field.
    ///
    /// JSON fields may arrive either already decoded or as an encoded string;
    /// both forms are accepted.
    pub fn get_json(&self, field: &str) -> Result<Option<Value>, serde_json::Error> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => serde_json::from_str(s).map(Some),
            Some(other) => Ok(Some(other.clone())),
        }
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the record and returns the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}
