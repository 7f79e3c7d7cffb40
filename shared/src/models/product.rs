//! Catalog models

use serde::{Deserialize, Serialize};

/// Recurring billing interval for subscription products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionInterval {
    Month,
    Year,
}

impl SubscriptionInterval {
    /// Wire value used both in the DB column and in Stripe price_data
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Product entity
///
/// `price` is a minor-unit integer (e.g. cents). `stock_quantity` of NULL
/// means stock is not tracked and never blocks an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub store_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub currency: String,
    pub is_subscription: bool,
    pub subscription_interval: Option<String>,
    pub subscription_interval_count: i32,
    pub stock_quantity: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Parsed recurring interval, when this is a subscription product
    pub fn interval(&self) -> Option<SubscriptionInterval> {
        self.subscription_interval
            .as_deref()
            .and_then(SubscriptionInterval::from_db)
    }
}

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_round_trip() {
        assert_eq!(
            SubscriptionInterval::from_db("month"),
            Some(SubscriptionInterval::Month)
        );
        assert_eq!(SubscriptionInterval::Year.as_str(), "year");
        assert_eq!(SubscriptionInterval::from_db("week"), None);
    }
}
