// src/lib.rs
use anyhow::Result;
use app_state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

use domain::create_noop_lockout;
use handlers::{health_check, metrics_handler, root_handler};
use redis::Client;
use std::env;

// Public exports (visible outside this module)
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;
mod password_reset;
mod security;
mod session;
mod throttle;
mod verification;

#[cfg(test)]
mod test_support;

// Hoist up only the public symbol(s)
pub use password_reset::{find_active_reset_token, issue_reset_token};
pub use session::{create_session, session_cookie, SessionInfo, SESSION_COOKIE};
pub use verification::{issue_verification_code, verify_code};

pub use config::*;

// Publicly expose the throttle primitives for callers embedding the engine
pub use throttle::{
    attach_fingerprint_cookie, build_keys, clear_limits, get_client_ip, get_fingerprint,
    increment, is_blocked, reset, ClientIdentity, EmailField, Scope, SCOPES,
};

// Publicly expose the crypto helpers named by the API surface
pub use security::{
    constant_time_equal, generate_reset_token, generate_verification_code, hash_password,
    hash_token, random_token_hex, verify_password,
};

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    create_log_mailer, // ---
    create_memory_counter_store,
    create_memory_repository,
    create_noop_metrics,
    create_postgres_repository,
    create_prom_metrics,
    create_queued_mailer,
    create_redis_counter_store,
    init_database_with_retry_from_env,
};

/// Build the HTTP router with metrics and counter backends determined by
/// environment variables.
pub fn create_router() -> Result<Router> {
    // ---
    // Load all configuration from environment
    let config = AppConfig::from_env()?;

    // Determine metrics implementation from environment
    let metrics_type = env::var("AUTHGUARD_METRICS_TYPE").unwrap_or_else(|_| "noop".to_string());
    let metrics = if metrics_type == "prom" {
        create_prom_metrics()?
    } else {
        create_noop_metrics()?
    };

    tracing_subscriber::fmt::try_init().ok(); // ✅ Ignores if already initialized

    // Create infrastructure dependencies
    let redis_client = Client::open(config.redis.url.clone())?;
    let counter_store = if config.throttle.counter_backend == "memory" {
        create_memory_counter_store()
    } else {
        create_redis_counter_store(redis_client.clone())
    };
    // Postgres is the default; the memory backend serves db-less runs.
    let repository_backend =
        env::var("AUTHGUARD_REPOSITORY_BACKEND").unwrap_or_else(|_| "postgres".to_string());
    let repository = if repository_backend == "memory" {
        create_memory_repository()
    } else {
        create_postgres_repository()?
    };
    let mailer = create_queued_mailer(create_log_mailer(), &config.email);
    let lockout = create_noop_lockout();

    // Build application state with all dependencies
    let app_state = AppState::new(
        redis_client,
        counter_store,
        repository,
        mailer,
        lockout,
        metrics,
        config,
    );

    // Build router
    //
    let router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest(
            "/auth",
            Router::new()
                .route("/register", post(handlers::register))
                .route("/login", post(handlers::login))
                .route("/verify", post(handlers::verify))
                .route("/verify/resend", post(handlers::resend))
                .route("/password-reset/request", post(handlers::request_reset))
                .route(
                    "/password-reset/confirm",
                    get(handlers::probe_reset).post(handlers::confirm_reset),
                ),
        )
        .nest(
            "/admin",
            Router::new().route("/rate-limits/clear", post(handlers::clear_rate_limits)),
        )
        .with_state(app_state);

    Ok(router)
}
