//! Subscription model — local mirror of a Stripe subscription

use serde::{Deserialize, Serialize};

/// Local subscription record, keyed by the processor's subscription id.
/// Status and billing-period fields are last-write-wins across webhook
/// deliveries (events may arrive out of order or duplicated).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: i64,
    pub store_id: i64,
    pub customer_id: Option<String>,
    pub customer_email: Option<String>,
    pub product_id: Option<i64>,
    pub stripe_subscription_id: String,
    pub status: String,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
