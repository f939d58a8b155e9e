use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::services::time::WIRE_FORMAT;

/// One stored record: a JSON object keyed by its `id` field
pub type Item = Map<String, Value>;

/// Primary key attribute of every record
pub const KEY_FIELD: &str = "id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {table}/{id}")]
    NotFound { table: String, id: String },

    #[error("Conditional write rejected for {table}/{id}")]
    ConditionFailed { table: String, id: String },

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("Invalid record: {0}")]
    InvalidItem(String),

    #[error("Field path {path} does not resolve in {table}/{id}")]
    InvalidPath { table: String, id: String, path: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a (possibly nested) attribute, e.g. `picking_points[2].picked_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn key(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(name.into())])
    }

    pub fn then_key(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(name.into()));
        self
    }

    pub fn then_index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Flattened form accepted by Postgres `jsonb_set`
    pub fn to_text_path(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(name) => name.clone(),
                PathSegment::Index(index) => index.to_string(),
            })
            .collect()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(name) if position == 0 => write!(f, "{}", name)?,
                PathSegment::Key(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Guard evaluated atomically with an update
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals { field: String, value: Value },
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn holds(&self, item: &Item) -> bool {
        match self {
            Condition::Equals { field, value } => item.get(field) == Some(value),
        }
    }
}

/// Set of attribute assignments applied to one record in a single write
#[derive(Debug, Clone, Default)]
pub struct Update {
    pub assignments: Vec<(FieldPath, Value)>,
    pub condition: Option<Condition>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: FieldPath, value: impl Into<Value>) -> Self {
        self.assignments.push((path, value.into()));
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub field: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Secondary-index style lookup: attribute equalities plus an optional inclusive time range.
/// Results come back ordered by the range field when one is given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub equals: Vec<(String, Value)>,
    pub range: Option<TimeRange>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn between(mut self, field: impl Into<String>, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.range = Some(TimeRange {
            field: field.into(),
            from,
            to,
        });
        self
    }

    pub fn matches(&self, item: &Item) -> bool {
        let equal = self
            .equals
            .iter()
            .all(|(field, value)| item.get(field) == Some(value));
        if !equal {
            return false;
        }
        match &self.range {
            Some(range) => match item.get(&range.field).and_then(stored_time) {
                Some(at) => at >= range.from && at <= range.to,
                None => false,
            },
            None => true,
        }
    }
}

/// Read a stored wire timestamp for range comparisons. Only the strict wire format counts,
/// so anything the range admits also hydrates.
pub fn stored_time(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    DateTime::parse_from_str(raw, WIRE_FORMAT)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Keyed record persistence used by repositories and directories
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, StoreError>;

    /// Insert or replace a whole record
    async fn put(&self, table: &str, item: Item) -> Result<(), StoreError>;

    /// Apply every assignment or none. Fails with `NotFound` when the record is absent and
    /// `ConditionFailed` when the guard does not hold at write time.
    async fn update(&self, table: &str, id: &str, update: Update) -> Result<(), StoreError>;

    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Item>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

pub(crate) fn item_key(item: &Item) -> Result<String, StoreError> {
    match item.get(KEY_FIELD).and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(StoreError::InvalidItem(format!(
            "record has no string '{}' attribute",
            KEY_FIELD
        ))),
    }
}
