//! shoal-cloud — multi-tenant storefront backend
//!
//! Long-running service that:
//! - Manages stores and their orders (JWT authenticated)
//! - Validates carts and takes orders with atomic stock decrements
//! - Creates Stripe checkout sessions and reconciles webhook events
//! - Fans domain events out to in-process subscribers
//! - Records an append-only analytics ledger per store

mod api;
mod auth;
mod config;
mod db;
mod error;
mod events;
mod state;
mod stripe;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoal_cloud=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting shoal-cloud (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    // Built-in event subscribers run for the lifetime of the process
    events::subscribers::spawn_all(&state);

    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("shoal-cloud HTTP listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
