//! Storefront service configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Storefront service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for customer/staff authentication
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Default URL to redirect to after a successful checkout
    /// (`{CHECKOUT_SESSION_ID}` is substituted by Stripe)
    pub checkout_success_url: String,
    /// Default URL to redirect to after a cancelled checkout
    pub checkout_cancel_url: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: environment.clone(),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            checkout_success_url: std::env::var("CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| {
                "https://example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}".into()
            }),
            checkout_cancel_url: std::env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "https://example.com/checkout/cancel".into()),
        })
    }
}
