// src/infrastructure/database/mod.rs

//! Postgres pool lifecycle and schema bootstrap.
//!
//! The pool is created once at startup by `init_database_with_retry_from_env`
//! and shared process-wide; repositories are cheap handles onto it.

mod memory_repository;
mod postgres_repository;

#[cfg(test)]
mod tests;

pub use memory_repository::create_memory_repository;
pub use postgres_repository::PostgresRepository;

#[cfg(test)]
pub use memory_repository::MemoryRepository;

use anyhow::{anyhow, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::OnceLock;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::domain::RepositoryPtr;

static POOL: OnceLock<PgPool> = OnceLock::new();

/// Idempotent schema bootstrap. Applied at startup rather than through a
/// migration framework; every statement tolerates re-execution.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        role TEXT NOT NULL,
        is_staff BOOLEAN NOT NULL DEFAULT FALSE,
        email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS verification_codes (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        code TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        used BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE INDEX IF NOT EXISTS idx_verification_codes_user
        ON verification_codes (user_id, used, created_at DESC)",
    "CREATE TABLE IF NOT EXISTS password_reset_tokens (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        token_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        used BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE INDEX IF NOT EXISTS idx_password_reset_tokens_hash
        ON password_reset_tokens (token_hash)",
    "CREATE TABLE IF NOT EXISTS sessions (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        token_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL
    )",
];

/// Connect to Postgres with bounded retry and apply the schema.
///
/// Intended to be called once by the binary (and by integration tests)
/// before the first repository is created. Subsequent calls are no-ops.
pub async fn init_database_with_retry_from_env() -> Result<()> {
    // ---
    if POOL.get().is_some() {
        return Ok(());
    }

    let config = DatabaseConfig::from_env()?;
    let pool = connect_with_retry(&config).await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }

    // A racing initializer may have won; its pool serves the same database.
    let _ = POOL.set(pool);
    Ok(())
}

async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool> {
    // ---
    let options = PgPoolOptions::new()
        .acquire_timeout(config.acquire_timeout)
        .min_connections(config.min_connections)
        .max_connections(config.max_connections);

    let mut last_err = None;
    for attempt in 1..=config.retry_count.max(1) {
        match options.clone().connect(&config.database_url).await {
            Ok(pool) => return Ok(pool),
            Err(err) => {
                tracing::warn!(
                    attempt,
                    retries = config.retry_count,
                    "database connect failed: {err}"
                );
                last_err = Some(err);
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
    Err(anyhow!(
        "database unreachable after {} attempts: {:?}",
        config.retry_count,
        last_err
    ))
}

/// Creates a repository over the initialized shared pool.
///
/// # Errors
/// Fails when `init_database_with_retry_from_env` has not run yet.
pub fn create_postgres_repository() -> Result<RepositoryPtr> {
    // ---
    let pool = POOL
        .get()
        .ok_or_else(|| anyhow!("database not initialized; call init_database_with_retry_from_env first"))?;
    Ok(Arc::new(PostgresRepository::new(pool.clone())))
}
