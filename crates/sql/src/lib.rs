#![doc = include_str!("../README.md")]

//! # Storage Backend Contract
//!
//! `strata-orm` speaks to storage through a single primitive:
//! [`Executor::execute`], which runs one parameterized SQL statement and
//! returns the resulting rows. Backends that can open transactions also
//! implement [`Database::begin`], handing back a connection-scoped
//! [`Transaction`] whose `execute` runs inside the transaction.
//!
//! Values cross the boundary as JSON ([`serde_json::Value`]): the engine is
//! dynamically shaped by design, and JSON scalars map cleanly onto SQL
//! parameter types. Statements that request the written record emit
//! `RETURNING *`; backends are assumed to support it.

#![forbid(unsafe_code)]

mod sqlite;

use std::fmt::Debug;
use std::sync::Arc;

use futures::future::BoxFuture;

pub use serde_json::Value;
pub use sqlite::SqliteDatabase;

/// Boxed future type returned by all contract trait methods, keeping the
/// traits object-safe.
pub type FutureResult<T> = BoxFuture<'static, anyhow::Result<T>>;

/// A flat result row: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Anything that can run one parameterized SQL statement.
///
/// Statements use `?` placeholders; `params` binds them in order. Statements
/// that produce no rows (writes without `RETURNING`) resolve to an empty
/// vector.
pub trait Executor: Debug + Send + Sync + 'static {
    /// Execute a single SQL statement and return the resulting rows.
    fn execute(&self, sql: String, params: Vec<Value>) -> FutureResult<Vec<Row>>;
}

/// A storage backend the engine can execute statements against.
pub trait Database: Executor {
    /// Open a transaction, returning a connection-scoped executor.
    ///
    /// Statements run through the returned [`Transaction`] are isolated until
    /// [`Transaction::commit`] is called. A transaction dropped without a
    /// commit must roll back; the engine never issues an explicit rollback.
    fn begin(&self) -> FutureResult<Arc<dyn Transaction>>;
}

/// A connection-scoped executor bound to one open transaction.
pub trait Transaction: Executor {
    /// Commit the transaction.
    fn commit(&self) -> FutureResult<()>;
}
