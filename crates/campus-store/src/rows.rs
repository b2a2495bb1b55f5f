//! [`RecordStore`] implementation for [`Database`].
//!
//! Rows travel as JSON objects; each column's [`ColumnKind`] decides how a
//! value is bound into SQLite and read back out. Column names are checked
//! against the collection's [`TableSpec`] before they reach any SQL text.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::collection::{Collection, ColumnKind, TableSpec};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::record_store::{ChangeFeed, Op, Query, RecordStore, Row};

#[async_trait]
impl RecordStore for Database {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Row>> {
        let spec = collection.spec();
        let query = Query::new().order_desc(spec.order_column);
        let conn = self.conn()?;
        select(&conn, spec, &query)
    }

    async fn insert(&self, collection: Collection, mut row: Row) -> Result<Row> {
        let spec = collection.spec();

        if !row.contains_key("id") {
            row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        let now = Value::String(timestamp_now());
        if !row.contains_key("created_at") {
            row.insert("created_at".into(), now.clone());
        }
        if spec.order_column != "created_at" && !row.contains_key(spec.order_column) {
            row.insert(spec.order_column.into(), now);
        }

        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (column, value) in &row {
            let kind = spec.column(column)?;
            columns.push(column.as_str());
            values.push(to_sql(kind, column, value)?);
        }

        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            spec.table,
            columns.join(", "),
            placeholders
        );

        self.conn()?
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| map_write_error(collection, e))?;

        tracing::debug!(%collection, id = ?row.get("id"), "row inserted");
        self.notify(collection);
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: Uuid, patch: Row) -> Result<()> {
        let spec = collection.spec();

        if patch.is_empty() {
            return Err(StoreError::InvalidRow("empty update patch".into()));
        }
        if patch.contains_key("id") {
            return Err(StoreError::InvalidRow("the id column cannot be updated".into()));
        }

        let mut assignments = Vec::with_capacity(patch.len());
        let mut values = Vec::with_capacity(patch.len() + 1);
        for (i, (column, value)) in patch.iter().enumerate() {
            let kind = spec.column(column)?;
            assignments.push(format!("{column} = ?{}", i + 1));
            values.push(to_sql(kind, column, value)?);
        }
        values.push(SqlValue::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            spec.table,
            assignments.join(", "),
            values.len()
        );

        let affected = self
            .conn()?
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| map_write_error(collection, e))?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::debug!(%collection, %id, "row updated");
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", collection.table_name());
        let affected = self
            .conn()?
            .execute(&sql, [id.to_string()])
            .map_err(|e| map_write_error(collection, e))?;

        if affected > 0 {
            tracing::debug!(%collection, %id, "row deleted");
            self.notify(collection);
        }
        Ok(affected > 0)
    }

    async fn query(&self, collection: Collection, query: Query) -> Result<Vec<Row>> {
        let conn = self.conn()?;
        select(&conn, collection.spec(), &query)
    }

    async fn subscribe(&self, collection: Collection) -> Result<ChangeFeed> {
        tracing::debug!(%collection, "change feed opened");
        Ok(ChangeFeed::new(collection, self.change_receiver()))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// RFC-3339 UTC timestamp with a fixed width so that text ordering matches
/// chronological ordering.
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn select(conn: &Connection, spec: &TableSpec, query: &Query) -> Result<Vec<Row>> {
    let mut sql = format!("SELECT {} FROM {}", spec.column_list(), spec.table);
    let mut values = Vec::with_capacity(query.conditions.len());

    for (i, condition) in query.conditions.iter().enumerate() {
        let kind = spec.column(&condition.column)?;
        let op = match condition.op {
            Op::Eq => "IS",
            Op::Neq => "IS NOT",
        };
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&format!("{} {op} ?{}", condition.column, i + 1));
        values.push(to_sql(kind, &condition.column, &condition.value)?);
    }

    let (order_column, descending) = match &query.order_by {
        Some((column, desc)) => {
            spec.column(column)?;
            (column.as_str(), *desc)
        }
        None => (spec.order_column, true),
    };
    let direction = if descending { "DESC" } else { "ASC" };
    // rowid breaks ties between rows written within the same microsecond.
    sql.push_str(&format!(" ORDER BY {order_column} {direction}, rowid {direction}"));

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(values.iter()))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (idx, (column, kind)) in spec.columns.iter().enumerate() {
            let raw: SqlValue = row.get(idx)?;
            record.insert((*column).to_string(), from_sql(*kind, column, raw)?);
        }
        out.push(record);
    }
    Ok(out)
}

fn to_sql(kind: ColumnKind, column: &str, value: &Value) -> Result<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    let mismatch = || StoreError::InvalidRow(format!("column `{column}` cannot hold {value}"));

    match kind {
        ColumnKind::Text => value
            .as_str()
            .map(|s| SqlValue::Text(s.to_string()))
            .ok_or_else(mismatch),
        ColumnKind::Integer => match value {
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            _ => value.as_i64().map(SqlValue::Integer).ok_or_else(mismatch),
        },
        ColumnKind::Real => value.as_f64().map(SqlValue::Real).ok_or_else(mismatch),
        ColumnKind::Json => Ok(SqlValue::Text(serde_json::to_string(value)?)),
    }
}

fn from_sql(kind: ColumnKind, column: &str, raw: SqlValue) -> Result<Value> {
    let value = match (kind, raw) {
        (_, SqlValue::Null) => Value::Null,
        (ColumnKind::Json, SqlValue::Text(text)) => serde_json::from_str(&text)?,
        (_, SqlValue::Text(text)) => Value::String(text),
        (_, SqlValue::Integer(i)) => Value::Number(i.into()),
        (_, SqlValue::Real(f)) => Number::from_f64(f).map(Value::Number).ok_or_else(|| {
            StoreError::InvalidRow(format!("column `{column}` holds a non-finite number"))
        })?,
        (_, SqlValue::Blob(_)) => {
            return Err(StoreError::InvalidRow(format!(
                "column `{column}` holds a blob"
            )))
        }
    };
    Ok(value)
}

fn map_write_error(collection: Collection, err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            StoreError::UniqueViolation {
                collection,
                message: message.unwrap_or_else(|| code.to_string()),
            }
        }
        other => StoreError::Sqlite(other),
    }
}
