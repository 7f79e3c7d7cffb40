//! Order models

use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// The normal progression is pending → paid → shipped → delivered, with
/// cancelled and refunded reachable from any non-terminal state. Transition
/// legality is NOT enforced: any status may overwrite any prior status by an
/// authorized actor or by webhook reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// Order entity
///
/// `total_amount` is a minor-unit integer and equals the sum of line item
/// totals at creation time. Processor references are filled by the Payment
/// Bridge as Stripe confirms the session/intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub store_id: i64,
    pub customer_id: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub status: String,
    pub total_amount: i64,
    pub currency: String,
    pub stripe_session_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub billing_address: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item — immutable once created; `unit_price` is the product's
/// price snapshotted at order time, independent of later price changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
    pub created_at: i64,
}

/// Line item annotated with product display fields for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItemDetail {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
    pub created_at: i64,
    pub product_name: String,
    pub product_description: Option<String>,
}

/// Order plus its annotated line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

/// One product/quantity pairing within a cart
///
/// Also the wire shape of the `items` JSON array round-tripped through Stripe
/// checkout metadata — field names must stay snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub items: Vec<CartLine>,
    pub shipping_address: Option<serde_json::Value>,
    pub billing_address: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(OrderStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(OrderStatus::from_db("archived"), None);
    }

    #[test]
    fn cart_line_metadata_wire_shape() {
        let lines = vec![
            CartLine { product_id: 7, quantity: 2 },
            CartLine { product_id: 9, quantity: 1 },
        ];
        let json = serde_json::to_string(&lines).unwrap();
        assert_eq!(json, r#"[{"product_id":7,"quantity":2},{"product_id":9,"quantity":1}]"#);

        let back: Vec<CartLine> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lines);
    }
}
