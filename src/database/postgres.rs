use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Row};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::database::manager::DatabaseManager;
use crate::database::store::{item_key, Condition, Item, RecordQuery, RecordStore, StoreError, Update};

const WIRE_TIME_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[+-]\d{4}$";

/// Record store over Postgres. Each table holds `(id TEXT PRIMARY KEY, data JSONB)`;
/// secondary indexes are expression indexes over `data`.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(settings: &StoreConfig) -> Result<Self, StoreError> {
        let pool = DatabaseManager::pool(settings).await?;
        Ok(Self::new(pool))
    }

    /// Create the table and its attribute indexes when missing
    pub async fn ensure_table(&self, table: &str, indexes: &[&[&str]]) -> Result<(), StoreError> {
        let quoted = Self::table(table)?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, data JSONB NOT NULL)",
            quoted
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        for fields in indexes {
            let ddl = Self::index_sql(&quoted, table, fields)?;
            sqlx::query(&ddl).execute(&self.pool).await?;
        }

        info!("Ensured table {} with {} index(es)", table, indexes.len());
        Ok(())
    }

    fn index_sql(quoted: &str, table: &str, fields: &[&str]) -> Result<String, StoreError> {
        if fields.is_empty() {
            return Err(StoreError::InvalidItem(format!("bad index definition {:?}", fields)));
        }
        let name = DatabaseManager::quote_identifier(&format!("{}_{}_idx", table, fields.join("_")));
        let columns = fields
            .iter()
            .map(|f| Ok(format!("(data ->> {})", Self::field(f)?)))
            .collect::<Result<Vec<_>, StoreError>>()?
            .join(", ");
        Ok(format!("CREATE INDEX IF NOT EXISTS {} ON {} ({})", name, quoted, columns))
    }

    fn table(name: &str) -> Result<String, StoreError> {
        if !DatabaseManager::is_valid_identifier(name) {
            return Err(StoreError::InvalidTable(name.to_string()));
        }
        Ok(DatabaseManager::quote_identifier(name))
    }

    /// Attribute names are inlined as literals so the planner can match them against the
    /// `(data ->> 'field')` expression indexes
    fn field(name: &str) -> Result<String, StoreError> {
        if !DatabaseManager::is_valid_identifier(name) {
            return Err(StoreError::InvalidItem(format!("bad field name {:?}", name)));
        }
        Ok(format!("'{}'", name))
    }

    /// Timestamp value of a wire-format attribute; NULL for anything else, matching what
    /// hydration accepts
    fn wire_time(key: &str) -> String {
        format!(
            "CASE WHEN data ->> {k} ~ '{p}' THEN (data ->> {k})::timestamptz END",
            k = key,
            p = WIRE_TIME_PATTERN
        )
    }

    /// `UPDATE` with nested `jsonb_set` calls; parameter `$1` is the record id
    fn update_sql(table: &str, update: &Update) -> Result<String, StoreError> {
        let mut expr = "data".to_string();
        let mut position = 2;
        for _ in &update.assignments {
            expr = format!("jsonb_set({}, ${}::text[], ${}::jsonb, true)", expr, position, position + 1);
            position += 2;
        }

        let mut sql = format!("UPDATE {} SET data = {} WHERE id = $1", table, expr);
        if let Some(Condition::Equals { field, .. }) = &update.condition {
            sql.push_str(&format!(" AND data -> {} = ${}::jsonb", Self::field(field)?, position));
        }
        Ok(sql)
    }

    fn select_sql(table: &str, query: &RecordQuery) -> Result<String, StoreError> {
        let mut sql = format!("SELECT data FROM {} WHERE TRUE", table);
        let mut position = 1;
        for (field, value) in &query.equals {
            let key = Self::field(field)?;
            if value.is_string() {
                sql.push_str(&format!(" AND data ->> {} = ${}", key, position));
            } else {
                sql.push_str(&format!(" AND data -> {} = ${}::jsonb", key, position));
            }
            position += 1;
        }
        match &query.range {
            Some(range) => {
                let at = Self::wire_time(&Self::field(&range.field)?);
                sql.push_str(&format!(
                    " AND {at} BETWEEN ${} AND ${} ORDER BY {at}",
                    position,
                    position + 1,
                    at = at
                ));
            }
            None => sql.push_str(" ORDER BY id"),
        }
        Ok(sql)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT data FROM {} WHERE id = $1", Self::table(table)?);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => {
                let Json(item): Json<Item> = row.try_get("data")?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let id = item_key(&item)?;
        let sql = format!(
            "INSERT INTO {} (id, data) VALUES ($1, $2) ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data",
            Self::table(table)?
        );
        sqlx::query(&sql).bind(id).bind(Json(item)).execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, table: &str, id: &str, update: Update) -> Result<(), StoreError> {
        let quoted = Self::table(table)?;
        let sql = Self::update_sql(&quoted, &update)?;
        debug!("store update {}/{}: {}", table, id, sql);

        let mut query = sqlx::query(&sql).bind(id.to_string());
        for (path, value) in &update.assignments {
            query = query.bind(path.to_text_path()).bind(Json(value.clone()));
        }
        if let Some(Condition::Equals { value, .. }) = &update.condition {
            query = query.bind(Json(value.clone()));
        }

        let result = query.execute(&self.pool).await?;
        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing matched: tell a missing record apart from a failed guard
        let exists = sqlx::query(&format!("SELECT 1 FROM {} WHERE id = $1", quoted))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if exists {
            Err(StoreError::ConditionFailed {
                table: table.to_string(),
                id: id.to_string(),
            })
        } else {
            Err(StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })
        }
    }

    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Item>, StoreError> {
        let sql = Self::select_sql(&Self::table(table)?, query)?;
        debug!("store query {}: {}", table, sql);

        let mut statement = sqlx::query(&sql);
        for (_, value) in &query.equals {
            statement = match value {
                Value::String(text) => statement.bind(text.clone()),
                other => statement.bind(Json(other.clone())),
            };
        }
        if let Some(range) = &query.range {
            statement = statement.bind(range.from).bind(range.to);
        }

        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<Item, StoreError> {
                let Json(item): Json<Item> = row.try_get("data")?;
                Ok(item)
            })
            .collect()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
