//! Typed domain-event envelopes carried by the fan-out bus
//!
//! Three event kinds, each independently published and independently
//! subscribed, with at-least-once delivery per subscriber. Field names
//! serialize in the camelCase wire shape external consumers already expect.
//! Timestamps are epoch milliseconds.

use serde::{Deserialize, Serialize};

/// Order status transition (staff update or webhook reconciliation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChangedEvent {
    pub order_id: i64,
    pub store_id: i64,
    pub customer_id: Option<String>,
    pub customer_email: String,
    pub old_status: String,
    pub new_status: String,
    pub timestamp: i64,
}

/// Tracked stock quantity change (order decrement or manual adjustment)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdatedEvent {
    pub product_id: i64,
    pub store_id: i64,
    pub old_stock: i64,
    pub new_stock: i64,
    pub timestamp: i64,
}

/// A new order was persisted (direct placement or checkout reconciliation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderEvent {
    pub order_id: i64,
    pub store_id: i64,
    pub customer_id: Option<String>,
    pub customer_email: String,
    pub total_amount: i64,
    pub timestamp: i64,
}

/// Envelope over the three event kinds
///
/// Subscribers receive each published event at least once; they must be
/// idempotent or tolerant of duplicate delivery. Each event is an independent
/// fact, not a queue position — no ordering is guaranteed across kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum DomainEvent {
    #[serde(rename = "order-status-changed")]
    OrderStatusChanged(OrderStatusChangedEvent),
    #[serde(rename = "stock-updated")]
    StockUpdated(StockUpdatedEvent),
    #[serde(rename = "new-order")]
    NewOrder(NewOrderEvent),
}

impl DomainEvent {
    /// Wire name of this event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderStatusChanged(_) => "order-status-changed",
            Self::StockUpdated(_) => "stock-updated",
            Self::NewOrder(_) => "new-order",
        }
    }

    /// Publish timestamp carried in the payload (epoch millis)
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::OrderStatusChanged(e) => e.timestamp,
            Self::StockUpdated(e) => e.timestamp,
            Self::NewOrder(e) => e.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_camel_case_and_kind_tagged() {
        let event = DomainEvent::StockUpdated(StockUpdatedEvent {
            product_id: 7,
            store_id: 1,
            old_stock: 5,
            new_stock: 3,
            timestamp: 1_700_000_000_000,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "stock-updated");
        assert_eq!(json["payload"]["productId"], 7);
        assert_eq!(json["payload"]["oldStock"], 5);
        assert_eq!(json["payload"]["newStock"], 3);

        let back: DomainEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.kind(), "stock-updated");
    }

    #[test]
    fn absent_customer_serializes_as_null() {
        let event = DomainEvent::NewOrder(NewOrderEvent {
            order_id: 42,
            store_id: 1,
            customer_id: None,
            customer_email: "shopper@example.com".into(),
            total_amount: 19_800,
            timestamp: 1_700_000_000_000,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["payload"]["customerId"].is_null());
        assert_eq!(json["payload"]["totalAmount"], 19_800);
    }
}
