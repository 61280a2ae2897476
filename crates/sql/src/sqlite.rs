//! Default `SQLite` implementation of the storage contract.
//!
//! This is a lightweight implementation for development use only.

#![allow(clippy::significant_drop_tightening)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use futures::FutureExt;
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params_from_iter};
use serde_json::Value;

use crate::{Database, Executor, FutureResult, Row, Transaction};

/// Default [`Database`] implementation backed by an embedded `SQLite`
/// database.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    // Mutex is necessary since rusqlite::Connection isn't `Sync`
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Open (or create) a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened.
    pub fn open(path: &str) -> Result<Self> {
        tracing::debug!("opening SQLite database at: {path}");
        let conn = Connection::open(path).context("failed to open SQLite database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl Executor for SqliteDatabase {
    fn execute(&self, sql: String, params: Vec<Value>) -> FutureResult<Vec<Row>> {
        let conn = Arc::clone(&self.conn);
        async move { run_statement(&conn, &sql, &params) }.boxed()
    }
}

impl Database for SqliteDatabase {
    fn begin(&self) -> FutureResult<Arc<dyn Transaction>> {
        let conn = Arc::clone(&self.conn);

        async move {
            conn.lock().execute_batch("BEGIN IMMEDIATE").context("failed to begin transaction")?;
            let tx = SqliteTransaction {
                conn,
                committed: Arc::new(AtomicBool::new(false)),
            };
            Ok(Arc::new(tx) as Arc<dyn Transaction>)
        }
        .boxed()
    }
}

/// A transaction scoped to the shared connection.
///
/// The connection mutex serializes statements, so statements from other
/// tasks would join the open transaction; acceptable for a development
/// backend.
#[derive(Debug)]
struct SqliteTransaction {
    conn: Arc<Mutex<Connection>>,
    committed: Arc<AtomicBool>,
}

impl Executor for SqliteTransaction {
    fn execute(&self, sql: String, params: Vec<Value>) -> FutureResult<Vec<Row>> {
        let conn = Arc::clone(&self.conn);
        async move { run_statement(&conn, &sql, &params) }.boxed()
    }
}

impl Transaction for SqliteTransaction {
    fn commit(&self) -> FutureResult<()> {
        let conn = Arc::clone(&self.conn);
        let committed = Arc::clone(&self.committed);

        async move {
            conn.lock().execute_batch("COMMIT").context("failed to commit transaction")?;
            committed.store(true, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.committed.load(Ordering::SeqCst) {
            let _ = self.conn.lock().execute_batch("ROLLBACK");
        }
    }
}

fn run_statement(conn: &Mutex<Connection>, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
    tracing::debug!("executing statement: {sql}");

    let conn = conn.lock();
    let mut stmt = conn.prepare(sql).context("failed to prepare statement")?;

    let bound: Vec<_> = params.iter().map(json_to_sqlite_value).collect();
    let column_names: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();

    let mut rows =
        stmt.query(params_from_iter(bound.iter())).context("failed to execute statement")?;

    let mut result_rows = Vec::new();
    while let Some(row) = rows.next().context("failed to fetch row")? {
        let mut fields = Row::new();
        for (i, name) in column_names.iter().enumerate() {
            let value = row.get_ref(i).context("failed to get column value")?;
            fields.insert(name.clone(), sqlite_value_to_json(value)?);
        }
        result_rows.push(fields);
    }

    Ok(result_rows)
}

fn json_to_sqlite_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        Value::Number(n) => n.as_i64().map_or_else(
            || rusqlite::types::Value::Real(n.as_f64().unwrap_or_default()),
            rusqlite::types::Value::Integer,
        ),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        // Structured values are stored as their JSON text
        composite @ (Value::Array(_) | Value::Object(_)) => {
            rusqlite::types::Value::Text(composite.to_string())
        }
    }
}

fn sqlite_value_to_json(value: ValueRef<'_>) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::from(i)),
        ValueRef::Real(f) => Ok(serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)),
        ValueRef::Text(t) => {
            let s = std::str::from_utf8(t).context("invalid UTF-8 in text value")?;
            Ok(Value::String(s.to_string()))
        }
        // The JSON wire model has no binary representation
        ValueRef::Blob(_) => Ok(Value::Null),
    }
}
