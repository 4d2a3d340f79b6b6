//! Redis-backed counter store.
//!
//! Each operation opens a multiplexed connection from the shared client,
//! the same per-request pattern the rest of the service uses for Redis.
//! `add` maps to `SET NX EX` and `incr` to `INCR`, the two atomic
//! primitives the throttle engine's lost-update safety rests on.

use anyhow::Result;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::CounterStore;

// ---

/// [`CounterStore`] over a shared Redis deployment.
pub struct RedisCounterStore {
    // ---
    client: redis::Client,
}

impl RedisCounterStore {
    // ---
    pub fn new(client: redis::Client) -> Self {
        // ---
        Self { client }
    }

    async fn conn(&self) -> Result<MultiplexedConnection> {
        // ---
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait::async_trait]
impl CounterStore for RedisCounterStore {
    // ---
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        // ---
        let mut conn = self.conn().await?;
        let value: Option<i64> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: i64, ttl: Duration) -> Result<()> {
        // ---
        let mut conn = self.conn().await?;
        let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn add(&self, key: &str, value: i64, ttl: Duration) -> Result<bool> {
        // ---
        let mut conn = self.conn().await?;

        // SET key value NX EX ttl; nil reply means the key already existed
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        // ---
        let mut conn = self.conn().await?;
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // ---
        let mut conn = self.conn().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        // ---
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        let _: () = conn.del(keys).await?;
        Ok(())
    }
}
