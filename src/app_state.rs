//! Application state management.
//!
//! This module defines the shared state structure that gets passed to all
//! Axum handlers via the `State` extractor. The `AppState` contains shared
//! resources like the counter store, repository, mailer, metrics, and the
//! validated configuration.
//!
//! The state is designed to be cheaply cloneable (using `Arc` internally
//! where needed) so it can be passed efficiently to each request handler
//! without expensive copying of resources.

use crate::config::AppConfig;
use crate::domain::{CounterStorePtr, LockoutPolicyPtr, MailerPtr, MetricsPtr, RepositoryPtr};
use axum::http::StatusCode;
use redis::Client;
use std::sync::Arc;

/// Shared application state passed to all Axum handlers.
///
/// This struct serves as the Dependency Injection container for the
/// application. Handlers depend on the port abstractions it carries
/// (Repository, CounterStore, Mailer, LockoutPolicy, Metrics), never on
/// concrete implementations, so tests substitute in-memory fakes without
/// touching handler code. Built once in `create_router()`, cloned by Axum
/// per request.
#[derive(Clone)]
pub(crate) struct AppState {
    /// Redis client for creating multiplexed async connections on demand.
    /// Used by the full-mode health check.
    redis_client: Client,

    /// Counter store backing the throttle engine.
    counter_store: CounterStorePtr,

    /// Repository abstraction for persistent storage.
    repository: RepositoryPtr,

    /// Email dispatch (enqueue-is-success semantics).
    mailer: MailerPtr,

    /// Secondary consecutive-failure lockout, queried by login.
    lockout: LockoutPolicyPtr,

    /// Metrics implementation for recording application events.
    metrics: MetricsPtr,

    /// Validated startup configuration (throttle policy, cookies, email).
    config: Arc<AppConfig>,
}

impl AppState {
    // ---

    pub fn new(
        redis_client: Client,
        counter_store: CounterStorePtr,
        repository: RepositoryPtr,
        mailer: MailerPtr,
        lockout: LockoutPolicyPtr,
        metrics: MetricsPtr,
        config: AppConfig,
    ) -> Self {
        // ---
        AppState {
            redis_client,
            counter_store,
            repository,
            mailer,
            lockout,
            metrics,
            config: Arc::new(config),
        }
    }

    /// Creates a new multiplexed Redis connection.
    ///
    /// Logs an error if connection fails and returns HTTP 500.
    pub(crate) async fn get_conn(&self) -> Result<redis::aio::MultiplexedConnection, StatusCode> {
        // ---
        self.redis_client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| {
                tracing::error!("Failed to connect to Redis: {:?}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            })
    }

    /// Get a reference to the counter store.
    pub(crate) fn counter_store(&self) -> &CounterStorePtr {
        // ---
        &self.counter_store
    }

    /// Get a reference to the repository implementation.
    pub(crate) fn repository(&self) -> &RepositoryPtr {
        // ---
        &self.repository
    }

    /// Get a reference to the mailer.
    pub(crate) fn mailer(&self) -> &MailerPtr {
        // ---
        &self.mailer
    }

    /// Get a reference to the secondary lockout policy.
    pub(crate) fn lockout(&self) -> &LockoutPolicyPtr {
        // ---
        &self.lockout
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }

    /// Get a reference to the configuration.
    pub(crate) fn config(&self) -> &AppConfig {
        // ---
        &self.config
    }
}
