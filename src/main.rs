use anyhow::Result;
use authguard::{create_router, init_database_with_retry_from_env};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    // Local development reads .env; deployed environments set real vars.
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber to log to stdout
    tracing_subscriber::fmt::init();
    info!("Starting AuthGuard server...");

    // Eager connect + schema bootstrap, with bounded retry so the service
    // survives a database that comes up after it. The memory backend has
    // nothing to bootstrap.
    let repository_backend =
        std::env::var("AUTHGUARD_REPOSITORY_BACKEND").unwrap_or_else(|_| "postgres".to_string());
    if repository_backend != "memory" {
        init_database_with_retry_from_env().await?;
    }

    let app = create_router()?;

    // Get optional bind endpoint from environment
    let endpoint =
        std::env::var("AUTHGUARD_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    info!("Starting at endpoint:{}", endpoint);
    info!("Starting AuthGuard API server v{}...", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&endpoint).await?;
    // Peer addresses feed the client-identity resolver.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
