#![doc = include_str!("../README.md")]

//! # Cache Backend Contract
//!
//! The engine treats its cache as a strict optimization: every call through
//! [`CacheStore`] is best-effort, and callers absorb errors (a failed read is
//! a miss, a failed write a no-op). Payloads are serialized JSON strings;
//! keys follow the engine's `<table>:<operation>:<args>` convention, which is
//! why [`CacheStore::list_keys`] takes a pattern: deleting `<table>:*`
//! implements table-wide invalidation.

#![forbid(unsafe_code)]

mod memory;

use std::fmt::Debug;
use std::time::Duration;

use futures::future::BoxFuture;

pub use memory::MemoryCache;

/// Boxed future type returned by all contract trait methods, keeping the
/// trait object-safe.
pub type FutureResult<T> = BoxFuture<'static, anyhow::Result<T>>;

/// A key/value cache with per-entry TTL and pattern-based key listing.
pub trait CacheStore: Debug + Send + Sync + 'static {
    /// Get the payload stored under `key`, if present and unexpired.
    fn get(&self, key: String) -> FutureResult<Option<String>>;

    /// Store `value` under `key` for at most `ttl`.
    fn set(&self, key: String, value: String, ttl: Duration) -> FutureResult<()>;

    /// Delete every key in `keys`. Missing keys are not an error.
    fn delete(&self, keys: Vec<String>) -> FutureResult<()>;

    /// List keys matching `pattern`.
    ///
    /// Implementations must support at least a trailing-`*` prefix pattern
    /// (`orders:*`); an exact key is also a valid pattern.
    fn list_keys(&self, pattern: String) -> FutureResult<Vec<String>>;
}
