use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::database::store::Item;
use crate::services::time::TimeService;

/// Errors that can occur while reading typed values out of a stored record
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    #[error("Invalid value for field '{field}': expected {expected}")]
    InvalidField { field: String, expected: &'static str },
    #[error("Invalid timestamp format for field '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },
}

/// A stored record with typed accessors. Absent or mistyped attributes read as the
/// zero value of the requested type; only `required_*` accessors fail.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Item,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_item(fields: Item) -> Self {
        Self { fields }
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn into_item(self) -> Item {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).map_or(false, |v| !v.is_null())
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Identity attributes must be present and non-empty
    pub fn required_str(&self, field: &str) -> Result<String, RecordError> {
        match self.fields.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                Err(RecordError::MissingRequiredField(field.to_string()))
            }
            Some(_) => Err(RecordError::InvalidField {
                field: field.to_string(),
                expected: "string",
            }),
        }
    }

    pub fn str_or_default(&self, field: &str) -> String {
        self.optional_str(field).unwrap_or_default()
    }

    pub fn optional_str(&self, field: &str) -> Option<String> {
        match self.fields.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Numbers may be stored as JSON numbers or numeric strings
    pub fn f64_or_default(&self, field: &str) -> f64 {
        match self.fields.get(field) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        }
    }

    pub fn optional_i64(&self, field: &str) -> Option<i64> {
        match self.fields.get(field) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Ordered list of strings; non-string entries are skipped
    pub fn string_list(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Nested object list, e.g. embedded stops
    pub fn records(&self, field: &str) -> Vec<Record> {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items.iter().cloned().filter_map(Record::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Wire timestamp hydrated through the time service. Null, empty or absent reads as `None`.
    pub fn timestamp(&self, field: &str, time: &TimeService) -> Result<Option<DateTime<Utc>>, RecordError> {
        match self.fields.get(field) {
            Some(Value::String(s)) if !s.is_empty() => time
                .from_iso8601(s)
                .map(Some)
                .map_err(|_| RecordError::InvalidTimestamp {
                    field: field.to_string(),
                    value: s.clone(),
                }),
            Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
            Some(other) => Err(RecordError::InvalidTimestamp {
                field: field.to_string(),
                value: other.to_string(),
            }),
        }
    }
}
