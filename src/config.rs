// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
///
/// Missing configuration is treated as a deployment error,
/// not a recoverable runtime condition.
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

/// Reads an optional environment variable as a string with a default.
macro_rules! optional_env {
    // ---
    ($key:literal, $default:expr) => {
        std::env::var($key).unwrap_or_else(|_| $default.to_string())
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
///
/// This macro is intended for config unit tests only and enforces
/// consistent error messages across failure cases.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub redis: redis::RedisConfig,
    pub throttle: throttle::ThrottleConfig,
    pub email: email::EmailConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            server: server::ServerConfig::from_env()?,
            database: database::DatabaseConfig::from_env()?,
            redis: redis::RedisConfig::from_env()?,
            throttle: throttle::ThrottleConfig::from_env()?,
            email: email::EmailConfig::from_env()?,
        })
    }
}

// ============================================================
// Server configuration
// ============================================================

mod server {
    // ---
    use super::*;

    /// HTTP-facing configuration: bind address, debug mode, session
    /// policy, and the admin token guarding privileged endpoints.
    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        /// Bind endpoint for the listener. Defaults to 127.0.0.1:8080.
        pub bind_addr: String,

        /// Debug deployments skip the Secure flag on issued cookies.
        pub debug: bool,

        /// Shared secret for the admin endpoints. When unset, those
        /// endpoints reject every caller.
        pub admin_token: Option<String>,

        /// Session lifetime. Defaults to 7 days.
        pub session_ttl: Duration,

        /// Public base URL used when composing emailed links.
        pub site_url: String,
    }

    impl ServerConfig {
        /// Builds a [`ServerConfig`] from environment variables.
        pub fn from_env() -> Result<Self> {
            // ---
            let bind_addr = optional_env!("AUTHGUARD_BIND_ADDR", "127.0.0.1:8080");
            let debug = optional_env_parse!("AUTHGUARD_DEBUG", bool, false);
            let admin_token = std::env::var("AUTHGUARD_ADMIN_TOKEN")
                .ok()
                .filter(|v| !v.is_empty());
            let session_ttl_secs = optional_env_parse!("AUTHGUARD_SESSION_TTL_SEC", u64, 604_800);
            let site_url = optional_env!("AUTHGUARD_SITE_URL", "http://localhost:8080");

            Ok(Self {
                bind_addr,
                debug,
                admin_token,
                session_ttl: Duration::from_secs(session_ttl_secs),
                site_url,
            })
        }
    }
}
pub use server::ServerConfig;

// ============================================================
// Database configuration
// ============================================================

mod database {
    // ---
    use super::*;

    /// Database-related configuration derived from environment variables.
    ///
    /// This configuration is required for the service to function and
    /// is validated eagerly during startup.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Number of retry attempts when initializing the database connection. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections to be open concurrently. Defaults to 15.
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if required configuration is missing.
        /// Startup will fail fast rather than continuing with incomplete
        /// or invalid configuration.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let retry_count = optional_env_parse!("AUTHGUARD_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs =
                optional_env_parse!("AUTHGUARD_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("AUTHGUARD_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("AUTHGUARD_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }
}
pub use database::DatabaseConfig;

// ============================================================
// Redis configuration
// ============================================================

mod redis {
    // ---
    use super::*;

    /// Redis-related configuration. Redis backs the attempt counters
    /// (and the full-mode health check).
    #[derive(Debug, Clone)]
    pub struct RedisConfig {
        /// Redis connection string.
        pub url: String,
    }

    impl RedisConfig {
        /// Builds a [`RedisConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if required configuration is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let url = required_env!("AUTHGUARD_REDIS_URL");

            Ok(Self { url })
        }
    }
}
pub use redis::RedisConfig;

// ============================================================
// Throttle configuration
// ============================================================

mod throttle {
    // ---
    use super::*;

    /// Rate-limit policy: per-scope attempt ceilings, the shared cooldown
    /// window, counter backend selection, and proxy-header trust.
    ///
    /// Limits are policy parameters with the historical defaults; every
    /// one is independently tunable.
    #[derive(Debug, Clone)]
    pub struct ThrottleConfig {
        /// Failed-attempt ceiling for email verification. Defaults to 5.
        pub verify_limit: i64,

        /// Failed-attempt ceiling for login. Defaults to 5.
        pub login_limit: i64,

        /// Failed-attempt ceiling for registration. Defaults to 3.
        pub register_limit: i64,

        /// Failed-attempt ceiling for reset-link requests. Defaults to 5.
        pub reset_request_limit: i64,

        /// Failed-attempt ceiling for reset confirmation. Defaults to 5.
        pub reset_confirm_limit: i64,

        /// Counter lifetime; the cooldown window. Defaults to 1 hour.
        pub cooldown: Duration,

        /// Counter backend: "redis" (default) or "memory".
        pub counter_backend: String,

        /// Whether x-forwarded-for may ever be honored. Defaults to false.
        pub trust_proxy: bool,

        /// Peer addresses allowed to supply x-forwarded-for. The header
        /// is honored only when `trust_proxy` is set AND the direct peer
        /// appears in this list.
        pub trusted_proxy_ips: Vec<String>,

        /// User-facing message rendered on a 429.
        pub lockout_message: String,
    }

    impl ThrottleConfig {
        /// Builds a [`ThrottleConfig`] from environment variables.
        pub fn from_env() -> Result<Self> {
            // ---
            let verify_limit = optional_env_parse!("AUTHGUARD_RL_VERIFY_LIMIT", i64, 5);
            let login_limit = optional_env_parse!("AUTHGUARD_RL_LOGIN_LIMIT", i64, 5);
            let register_limit = optional_env_parse!("AUTHGUARD_RL_REGISTER_LIMIT", i64, 3);
            let reset_request_limit =
                optional_env_parse!("AUTHGUARD_RL_RESET_REQUEST_LIMIT", i64, 5);
            let reset_confirm_limit =
                optional_env_parse!("AUTHGUARD_RL_RESET_CONFIRM_LIMIT", i64, 5);
            let cooldown_secs = optional_env_parse!("AUTHGUARD_RL_COOLDOWN_SEC", u64, 3600);
            let counter_backend = optional_env!("AUTHGUARD_COUNTER_BACKEND", "redis");
            let trust_proxy = optional_env_parse!("AUTHGUARD_TRUST_PROXY", bool, false);
            let trusted_proxy_ips = std::env::var("AUTHGUARD_TRUSTED_PROXY_IPS")
                .ok()
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let lockout_message = optional_env!(
                "AUTHGUARD_LOCKOUT_MESSAGE",
                "Too many failed attempts. Please try again later."
            );

            Ok(Self {
                verify_limit,
                login_limit,
                register_limit,
                reset_request_limit,
                reset_confirm_limit,
                cooldown: Duration::from_secs(cooldown_secs),
                counter_backend,
                trust_proxy,
                trusted_proxy_ips,
                lockout_message,
            })
        }
    }
}
pub use throttle::ThrottleConfig;

// ============================================================
// Email configuration
// ============================================================

mod email {
    // ---
    use super::*;

    /// Outbound-email configuration: sender identity, reset-token
    /// lifetime, and the delivery queue's retry schedule.
    #[derive(Debug, Clone)]
    pub struct EmailConfig {
        /// From address on every outbound message.
        pub from_address: String,

        /// Reset-token validity window. Defaults to 10 minutes.
        pub reset_token_ttl: Duration,

        /// Delivery attempts after the first failure. Defaults to 3.
        pub max_retries: u32,

        /// Base delay before the first redelivery; doubles per retry.
        /// Defaults to 60 seconds.
        pub retry_backoff: Duration,
    }

    impl EmailConfig {
        /// Builds an [`EmailConfig`] from environment variables.
        pub fn from_env() -> Result<Self> {
            // ---
            let from_address = optional_env!("AUTHGUARD_EMAIL_FROM", "no-reply@localhost");
            let reset_token_ttl_min = optional_env_parse!("AUTHGUARD_RESET_TOKEN_TTL_MIN", u64, 10);
            let max_retries = optional_env_parse!("AUTHGUARD_EMAIL_MAX_RETRIES", u32, 3);
            let retry_backoff_secs =
                optional_env_parse!("AUTHGUARD_EMAIL_RETRY_BACKOFF_SEC", u64, 60);

            Ok(Self {
                from_address,
                reset_token_ttl: Duration::from_secs(reset_token_ttl_min * 60),
                max_retries,
                retry_backoff: Duration::from_secs(retry_backoff_secs),
            })
        }
    }
}
pub use email::EmailConfig;

// ============================================================
// Tests
// ============================================================
