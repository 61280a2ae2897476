//! Default in-memory implementation of the cache contract.
//!
//! This is a lightweight implementation for development use only.

use std::time::{Duration, Instant};

use futures::FutureExt;
use moka::sync::Cache;

use crate::{CacheStore, FutureResult};

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Default [`CacheStore`] implementation backed by an in-process cache.
///
/// TTLs are tracked per entry; expired entries read as misses and are evicted
/// lazily on access.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, Entry>,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache").finish_non_exhaustive()
    }
}

impl MemoryCache {
    /// Create a cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    fn live_entry(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            self.entries.invalidate(key);
            return None;
        }
        Some(entry.value)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: String) -> FutureResult<Option<String>> {
        let value = self.live_entry(&key);
        async move { Ok(value) }.boxed()
    }

    fn set(&self, key: String, value: String, ttl: Duration) -> FutureResult<()> {
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        async move { Ok(()) }.boxed()
    }

    fn delete(&self, keys: Vec<String>) -> FutureResult<()> {
        for key in &keys {
            self.entries.invalidate(key);
        }
        async move { Ok(()) }.boxed()
    }

    fn list_keys(&self, pattern: String) -> FutureResult<Vec<String>> {
        tracing::debug!("listing cache keys matching: {pattern}");
        let now = Instant::now();
        let keys = self
            .entries
            .iter()
            .filter(|(key, entry)| entry.expires_at > now && key_matches(key, &pattern))
            .map(|(key, _)| (*key).clone())
            .collect();
        async move { Ok(keys) }.boxed()
    }
}

fn key_matches(key: &str, pattern: &str) -> bool {
    pattern.strip_suffix('*').map_or_else(|| key == pattern, |prefix| key.starts_with(prefix))
}
