use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::database::store::{
    item_key, stored_time, Item, PathSegment, RecordQuery, RecordStore, StoreError, Update,
};

type Table = BTreeMap<String, Item>;

/// Process-local record store. Updates run under the table write lock, so a conditional
/// update observes and replaces the record atomically.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|rows| rows.get(id)).cloned())
    }

    async fn put(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let id = item_key(&item)?;
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().insert(id, item);
        Ok(())
    }

    async fn update(&self, table: &str, id: &str, update: Update) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let current = tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        if let Some(condition) = &update.condition {
            if !condition.holds(current) {
                return Err(StoreError::ConditionFailed {
                    table: table.to_string(),
                    id: id.to_string(),
                });
            }
        }

        // Apply to a copy so a bad path leaves the stored record untouched
        let mut next = Value::Object(current.clone());
        for (path, value) in update.assignments {
            if !assign(&mut next, path.segments(), value) {
                return Err(StoreError::InvalidPath {
                    table: table.to_string(),
                    id: id.to_string(),
                    path: path.to_string(),
                });
            }
        }

        if let Value::Object(map) = next {
            *current = map;
        }
        debug!("memory store updated {}/{}", table, id);
        Ok(())
    }

    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Item>, StoreError> {
        let tables = self.tables.read().await;
        let mut items: Vec<Item> = tables
            .get(table)
            .map(|rows| rows.values().filter(|item| query.matches(item)).cloned().collect())
            .unwrap_or_default();

        if let Some(range) = &query.range {
            items.sort_by_key(|item| item.get(&range.field).and_then(stored_time));
        }
        Ok(items)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Set `value` at `segments` inside `target`. The final key may be new; every
/// intermediate step must already exist.
fn assign(target: &mut Value, segments: &[PathSegment], value: Value) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return true;
    };

    match (head, target) {
        (PathSegment::Key(name), Value::Object(map)) => {
            if rest.is_empty() {
                map.insert(name.clone(), value);
                return true;
            }
            match map.get_mut(name) {
                Some(child) => assign(child, rest, value),
                None => false,
            }
        }
        (PathSegment::Index(index), Value::Array(list)) => match list.get_mut(*index) {
            Some(child) => assign(child, rest, value),
            None => false,
        },
        _ => false,
    }
}
