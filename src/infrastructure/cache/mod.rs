// src/infrastructure/cache/mod.rs
mod memory_counter_store;
mod redis_counter_store;

pub use memory_counter_store::MemoryCounterStore;
pub use redis_counter_store::RedisCounterStore;

use crate::domain::CounterStorePtr;
use std::sync::Arc;

/// Creates a Redis-backed counter store sharing the given client.
pub fn create_redis_counter_store(client: redis::Client) -> CounterStorePtr {
    // ---
    Arc::new(RedisCounterStore::new(client))
}

/// Creates an in-memory counter store.
///
/// Mirrors the Redis semantics (atomic add/incr, per-entry expiry) for
/// tests and redis-less development.
pub fn create_memory_counter_store() -> CounterStorePtr {
    // ---
    Arc::new(MemoryCounterStore::new())
}
