//! Pluggable primary-key generation for create operations.

use std::fmt::Debug;

use serde_json::Value;
use uuid::Uuid;

/// Strategy for assigning a primary key to a record being created whose key
/// is absent or null.
pub trait IdStrategy: Debug + Send + Sync + 'static {
    /// A value for the new record's primary key, or `None` to leave
    /// assignment to the backend.
    fn next_id(&self) -> Option<Value>;
}

/// Assigns random UUIDv4 strings. The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdStrategy for UuidIds {
    fn next_id(&self) -> Option<Value> {
        Some(Value::String(Uuid::new_v4().to_string()))
    }
}

/// Leaves primary keys to the backend (auto-increment columns, database
/// defaults).
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendAssigned;

impl IdStrategy for BackendAssigned {
    fn next_id(&self) -> Option<Value> {
        None
    }
}
