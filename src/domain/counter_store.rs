use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Abstraction over the shared key-value store backing attempt counters.
///
/// The port exposes the primitive operations the throttle engine composes
/// (see `throttle::engine`); implementations must make `add` and `incr`
/// atomic with respect to concurrent callers. `incr` follows Redis
/// semantics: an absent key is created at 1 with no expiry, and the new
/// value is returned.
#[async_trait::async_trait]
pub trait CounterStore: Send + Sync {
    // ---
    /// Current count for the key, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    /// Unconditionally set the key to `value` with a fresh TTL.
    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<()>;

    /// Create the key with `value` and the TTL only if it does not exist.
    /// Returns true when this call created the key.
    async fn add(&self, key: &str, value: i64, ttl: Duration) -> Result<bool>;

    /// Atomically increment the key, returning the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Delete a single key. Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete a batch of keys in one round trip where the backend allows.
    async fn delete_many(&self, keys: &[String]) -> Result<()>;
}

/// Type alias for any backend that implements CounterStore.
pub type CounterStorePtr = Arc<dyn CounterStore>;
