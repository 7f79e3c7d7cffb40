//! Application state for shoal-cloud

use sqlx::PgPool;

use crate::config::Config;
use crate::events::EventBus;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Domain event fan-out hub
    pub events: EventBus,
    /// JWT secret for customer/staff authentication
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Default checkout redirect URLs
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
}

impl AppState {
    /// Create a new AppState: connect the pool and run pending migrations.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            events: EventBus::new(),
            jwt_secret: config.jwt_secret.clone(),
            stripe_secret_key: config.stripe_secret_key.clone(),
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            checkout_success_url: config.checkout_success_url.clone(),
            checkout_cancel_url: config.checkout_cancel_url.clone(),
        })
    }
}
