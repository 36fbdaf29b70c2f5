use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fullstack_api::{build_router, Config, RouteTable, SpannerConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("fullstack-api starting");

    let config = Arc::new(Config::from_env()?);
    config.log_startup();

    // The database is dialed by the first mounted route that gets a request
    let connector = Arc::new(SpannerConnector::new(config.clone()));

    // Application routes are supplied by embedding crates; the stock binary
    // serves only the built-in routes.
    let router = build_router(&config, RouteTable::empty(), connector)?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!("Server started on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
