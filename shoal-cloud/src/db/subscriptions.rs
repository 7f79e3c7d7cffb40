//! Subscription mirror queries
//!
//! Rows are keyed by `stripe_subscription_id`; Stripe is the source of truth
//! and whatever the latest webhook says wins.

use sqlx::PgPool;

pub struct UpsertSubscription<'a> {
    pub store_id: i64,
    pub product_id: Option<i64>,
    pub customer_id: Option<&'a str>,
    pub customer_email: Option<&'a str>,
    pub stripe_subscription_id: &'a str,
    pub status: &'a str,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub now: i64,
}

pub async fn upsert(pool: &PgPool, sub: &UpsertSubscription<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subscriptions (store_id, product_id, customer_id, customer_email,
                                    stripe_subscription_id, status, current_period_start,
                                    current_period_end, cancel_at_period_end, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
         ON CONFLICT (stripe_subscription_id) DO UPDATE SET
            status = $6, current_period_start = $7, current_period_end = $8,
            cancel_at_period_end = $9, updated_at = $10",
    )
    .bind(sub.store_id)
    .bind(sub.product_id)
    .bind(sub.customer_id)
    .bind(sub.customer_email)
    .bind(sub.stripe_subscription_id)
    .bind(sub.status)
    .bind(sub.current_period_start)
    .bind(sub.current_period_end)
    .bind(sub.cancel_at_period_end)
    .bind(sub.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_status(
    pool: &PgPool,
    stripe_subscription_id: &str,
    status: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE subscriptions SET status = $2, updated_at = $3 WHERE stripe_subscription_id = $1",
    )
    .bind(stripe_subscription_id)
    .bind(status)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_periods(
    pool: &PgPool,
    stripe_subscription_id: &str,
    status: &str,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    cancel_at_period_end: bool,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE subscriptions
         SET status = $2, current_period_start = $3, current_period_end = $4,
             cancel_at_period_end = $5, updated_at = $6
         WHERE stripe_subscription_id = $1",
    )
    .bind(stripe_subscription_id)
    .bind(status)
    .bind(current_period_start)
    .bind(current_period_end)
    .bind(cancel_at_period_end)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
