//! Throttle decision engine.
//!
//! Composes the counter-store port into the check-then-act-then-record
//! pattern every protected flow shares: consult `is_blocked` before the
//! action, then `increment` on failure or `reset` on success.

use anyhow::Result;
use std::time::Duration;

use crate::domain::CounterStore;
use crate::throttle::keys::{build_keys, normalize_email, Scope};

// ---

/// True when any key's count has reached the limit. Absent keys count 0.
pub async fn is_blocked(store: &dyn CounterStore, keys: &[String], limit: i64) -> Result<bool> {
    // ---
    for key in keys {
        if store.get(key).await?.unwrap_or(0) >= limit {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Record one failed attempt against every key.
///
/// Per key: create at 1 with the TTL, or atomically increment when it
/// already exists. Two recoveries keep the failure path soft:
///
/// - `incr` landing on a key evicted between the add and the increment
///   creates it at 1 with no expiry; that fresh-key case (returned value
///   1) is rewritten as `set(key, 1, ttl)` so the window still expires.
/// - A per-key transient failure from `incr` also falls back to a fresh
///   window rather than surfacing an error.
///
/// A connection-dead backend still propagates from `add`; the caller maps
/// that to a 500 exactly as any other infrastructure failure.
pub async fn increment(store: &dyn CounterStore, keys: &[String], ttl: Duration) -> Result<()> {
    // ---
    for key in keys {
        let created = store.add(key, 1, ttl).await?;
        if created {
            continue;
        }
        match store.incr(key).await {
            Ok(1) => {
                // Key vanished between add and incr; restart the window.
                store.set(key, 1, ttl).await?;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("counter increment failed for {key}, restarting window: {err}");
                store.set(key, 1, ttl).await?;
            }
        }
    }
    Ok(())
}

/// Clear the penalty after a successful action. Absent keys are a no-op.
pub async fn reset(store: &dyn CounterStore, keys: &[String]) -> Result<()> {
    // ---
    store.delete_many(keys).await
}

/// Administrative bulk clear across the given scopes.
///
/// Per scope, deletes the ip key (when an ip is given), the fp key (when
/// a fingerprint is given), and the ip+email composite (when both ip and
/// email are given), in that order. Returns the deleted key names.
pub async fn clear_limits(
    store: &dyn CounterStore,
    scopes: &[Scope],
    ip: Option<&str>,
    email: Option<&str>,
    fingerprint: Option<&str>,
) -> Result<Vec<String>> {
    // ---
    let email = email.map(normalize_email).filter(|e| !e.is_empty());

    let mut keys = Vec::new();
    for scope in scopes {
        let scope = scope.as_str();
        if let Some(ip) = ip {
            keys.push(format!("rl:{scope}:ip:{ip}"));
        }
        if let Some(fp) = fingerprint {
            keys.push(format!("rl:{scope}:fp:{fp}"));
        }
        if let (Some(ip), Some(email)) = (ip, &email) {
            keys.push(format!("rl:{scope}:ip_email:{ip}:{email}"));
        }
    }

    if !keys.is_empty() {
        store.delete_many(&keys).await?;
    }
    Ok(keys)
}

/// Build the keys for one attempt in a scope. Thin re-export point so
/// handlers reach the whole engine through one module.
pub fn attempt_keys(scope: Scope, ip: &str, email: Option<&str>, fingerprint: &str) -> Vec<String> {
    // ---
    build_keys(scope, ip, email, fingerprint)
}
