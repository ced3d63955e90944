//! Facet values

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// One distinct value of a field together with how many records carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    /// The distinct field value.
    pub value: Value,
    /// Number of matching records.
    #[serde(default)]
    pub count: u64,
}

impl FacetValue {
    /// Creates a new facet value.
    pub fn new(value: impl Into<Value>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }

    /// Returns the value as display text.
    pub fn label(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
