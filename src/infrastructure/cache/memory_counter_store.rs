//! In-memory counter store.
//!
//! A mutex-guarded map with per-entry expiry, matching the Redis adapter's
//! observable semantics so the engine behaves identically on either
//! backend. Expired entries are dropped lazily on access.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::CounterStore;

// ---

struct Entry {
    // ---
    value: i64,

    /// None means no expiry (a bare incr on an absent key).
    expires_at: Option<Instant>,
}

impl Entry {
    // ---
    fn is_expired(&self, now: Instant) -> bool {
        // ---
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Process-local [`CounterStore`] for tests and redis-less development.
pub struct MemoryCounterStore {
    // ---
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCounterStore {
    // ---
    pub fn new() -> Self {
        // ---
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCounterStore {
    // ---
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CounterStore for MemoryCounterStore {
    // ---
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        // ---
        let mut entries = self.entries.lock().expect("counter map poisoned");
        let now = Instant::now();

        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        Ok(entries.get(key).map(|e| e.value))
    }

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<()> {
        // ---
        let mut entries = self.entries.lock().expect("counter map poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn add(&self, key: &str, value: i64, ttl: Duration) -> Result<bool> {
        // ---
        let mut entries = self.entries.lock().expect("counter map poisoned");
        let now = Instant::now();

        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        // ---
        let mut entries = self.entries.lock().expect("counter map poisoned");
        let now = Instant::now();

        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        let entry = entries.entry(key.to_string()).or_insert(Entry {
            value: 0,
            expires_at: None,
        });
        entry.value += 1;
        Ok(entry.value)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // ---
        self.entries
            .lock()
            .expect("counter map poisoned")
            .remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        // ---
        let mut entries = self.entries.lock().expect("counter map poisoned");
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}
