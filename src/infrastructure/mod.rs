mod cache;
mod database;
mod email;
pub mod metrics;

// Re-export the factory functions for easy access
pub use cache::{create_memory_counter_store, create_redis_counter_store};
pub use database::{
    create_memory_repository, create_postgres_repository, init_database_with_retry_from_env,
};

// The concrete type doubles as the unit suites' repository fixture.
#[cfg(test)]
pub use database::MemoryRepository;
pub use email::{create_log_mailer, create_queued_mailer};
pub use metrics::{create_noop_metrics, create_prom_metrics};
