//! SQLite-backed record store.
//!
//! Rows are stored in wire form: ids and timestamps as text exactly as the
//! codec produced them, the checklist as a JSON column. Queries are built
//! from [`Match`] predicates against a fixed column whitelist, so a filter
//! can never reach a column the schema does not have.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{Match, OrderBy, RecordFilter, StoreError, TaskStore, TASKS};
use crate::codec::{wire, WireRecord};

const COLUMNS: &[&str] = &[
    wire::ID,
    wire::OWNER_ID,
    wire::TITLE,
    wire::NOTES,
    wire::START_TIME,
    wire::END_TIME,
    wire::STATUS,
    wire::CHECKLIST,
    wire::IS_IMPORTANT,
    wire::RECURRENCE,
    wire::RECURRING_TEMPLATE_ID,
    wire::CREATED_AT,
];

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the database at `db_path`, creating the file and its parent
    /// directories when needed, and runs pending migrations.
    pub async fn connect(db_path: &str) -> Result<Self, StoreError> {
        if db_path != ":memory:" && !db_path.starts_with("sqlite:") {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            if !Path::new(db_path).exists() {
                tokio::fs::File::create(db_path).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_path)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn check_collection(collection: &str) -> Result<(), StoreError> {
    if collection == TASKS {
        Ok(())
    } else {
        Err(StoreError::UnknownCollection(collection.to_string()))
    }
}

fn check_field(field: &str) -> Result<(), StoreError> {
    if COLUMNS.contains(&field) {
        Ok(())
    } else {
        Err(StoreError::UnsupportedField(field.to_string()))
    }
}

/// Binds a JSON value as its SQLite representation. Arrays and objects are
/// bound as their JSON text.
fn push_value(qb: &mut QueryBuilder<Sqlite>, value: &Value) -> Result<(), StoreError> {
    match value {
        Value::Null => {
            qb.push("NULL");
        }
        Value::Bool(b) => {
            qb.push_bind(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else if let Some(f) = n.as_f64() {
                qb.push_bind(f);
            } else {
                return Err(StoreError::MalformedRecord(format!(
                    "unbindable number: {}",
                    n
                )));
            }
        }
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        other => {
            qb.push_bind(other.to_string());
        }
    }
    Ok(())
}

fn push_match(qb: &mut QueryBuilder<Sqlite>, matching: &Match) -> Result<(), StoreError> {
    match matching {
        Match::Eq(field, value) => {
            check_field(field)?;
            qb.push(*field);
            if value.is_null() {
                qb.push(" IS NULL");
            } else {
                qb.push(" = ");
                push_value(qb, value)?;
            }
        }
        Match::In(field, values) => {
            check_field(field)?;
            if values.is_empty() {
                // An empty id set matches nothing.
                qb.push("0 = 1");
            } else {
                qb.push(*field);
                qb.push(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    push_value(qb, value)?;
                }
                qb.push(")");
            }
        }
        Match::Either(a, b) => {
            qb.push("(");
            push_match(qb, a)?;
            qb.push(") OR (");
            push_match(qb, b)?;
            qb.push(")");
        }
    }
    Ok(())
}

fn text_field(record: &WireRecord, field: &str) -> Result<String, StoreError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::MalformedRecord(format!("missing text field: {}", field)))
}

fn optional_text_field(record: &WireRecord, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn bool_field(record: &WireRecord, field: &str) -> bool {
    record.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn json_field(record: &WireRecord, field: &str) -> String {
    record
        .get(field)
        .map_or_else(|| "[]".to_string(), Value::to_string)
}

fn row_to_record(row: &SqliteRow) -> Result<WireRecord, StoreError> {
    let mut record = WireRecord::new();
    for field in [
        wire::ID,
        wire::OWNER_ID,
        wire::TITLE,
        wire::START_TIME,
        wire::END_TIME,
        wire::STATUS,
        wire::RECURRENCE,
        wire::CREATED_AT,
    ] {
        let value: String = row.try_get(field)?;
        record.insert(field.to_string(), Value::String(value));
    }
    for field in [wire::NOTES, wire::RECURRING_TEMPLATE_ID] {
        let value: Option<String> = row.try_get(field)?;
        record.insert(field.to_string(), value.map_or(Value::Null, Value::String));
    }

    let is_important: bool = row.try_get(wire::IS_IMPORTANT)?;
    record.insert(wire::IS_IMPORTANT.to_string(), Value::Bool(is_important));

    let checklist: String = row.try_get(wire::CHECKLIST)?;
    let checklist: Value = serde_json::from_str(&checklist)
        .map_err(|e| StoreError::MalformedRecord(format!("checklist: {}", e)))?;
    record.insert(wire::CHECKLIST.to_string(), checklist);

    Ok(record)
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn query(
        &self,
        collection: &str,
        filter: RecordFilter,
    ) -> Result<Vec<WireRecord>, StoreError> {
        check_collection(collection)?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(COLUMNS.join(", "));
        qb.push(" FROM tasks WHERE ");
        push_match(&mut qb, &filter.matching)?;

        if let Some(OrderBy { field, descending }) = filter.order_by {
            check_field(field)?;
            qb.push(" ORDER BY ");
            qb.push(field);
            qb.push(if descending { " DESC" } else { " ASC" });
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn insert(
        &self,
        collection: &str,
        record: WireRecord,
    ) -> Result<WireRecord, StoreError> {
        check_collection(collection)?;

        let mut stored = record;
        if !stored.contains_key(wire::ID) {
            stored.insert(
                wire::ID.to_string(),
                Value::String(Uuid::now_v7().to_string()),
            );
        }
        if !stored.contains_key(wire::CREATED_AT) {
            stored.insert(
                wire::CREATED_AT.to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        for field in stored.keys() {
            check_field(field)?;
        }

        sqlx::query(
            r#"INSERT INTO tasks (id, owner_id, title, notes, start_time, end_time, status, checklist, is_important, recurrence, recurring_template_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(text_field(&stored, wire::ID)?)
        .bind(text_field(&stored, wire::OWNER_ID)?)
        .bind(text_field(&stored, wire::TITLE)?)
        .bind(optional_text_field(&stored, wire::NOTES))
        .bind(text_field(&stored, wire::START_TIME)?)
        .bind(text_field(&stored, wire::END_TIME)?)
        .bind(text_field(&stored, wire::STATUS)?)
        .bind(json_field(&stored, wire::CHECKLIST))
        .bind(bool_field(&stored, wire::IS_IMPORTANT))
        .bind(text_field(&stored, wire::RECURRENCE)?)
        .bind(optional_text_field(&stored, wire::RECURRING_TEMPLATE_ID))
        .bind(text_field(&stored, wire::CREATED_AT)?)
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        patch: WireRecord,
    ) -> Result<(), StoreError> {
        check_collection(collection)?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
        let mut updated = false;
        for (field, value) in &patch {
            if field.as_str() == wire::ID {
                continue;
            }
            check_field(field)?;
            if updated {
                qb.push(", ");
            }
            qb.push(field.as_str());
            qb.push(" = ");
            push_value(&mut qb, value)?;
            updated = true;
        }
        if !updated {
            return Ok(());
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRecord(id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        check_collection(collection)?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRecord(id));
        }
        Ok(())
    }

    async fn delete_many(&self, collection: &str, ids: &[Uuid]) -> Result<(), StoreError> {
        check_collection(collection)?;
        if ids.is_empty() {
            return Ok(());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM tasks WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        qb.build().execute(&self.pool).await?;
        Ok(())
    }
}
