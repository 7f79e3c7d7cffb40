//! Built-in event subscribers
//!
//! Each subscriber runs as its own tokio task over a dedicated channel, so a
//! failure in one never touches the others. All three are spawned at startup.

use sqlx::PgPool;
use tokio::task::JoinHandle;

use shared::events::{DomainEvent, NewOrderEvent, StockUpdatedEvent};

use crate::db;
use crate::events::{EventBus, EventKind};
use crate::state::AppState;

/// Stock level at or below which a warning is emitted.
const LOW_STOCK_ALERT_THRESHOLD: i64 = 5;

/// Spawn all built-in subscribers.
pub fn spawn_all(state: &AppState) -> Vec<JoinHandle<()>> {
    vec![
        spawn_order_status_notifier(&state.events),
        spawn_stock_alert_logger(&state.events),
        spawn_purchase_tracker(&state.events, state.pool.clone()),
    ]
}

/// Logs customer-facing notifications for order status transitions.
///
/// Stands in for the outbound email/push channel; everything a notification
/// provider would need is in the log record.
pub fn spawn_order_status_notifier(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe("order-status-notifier", EventKind::OrderStatusChanged);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let DomainEvent::OrderStatusChanged(e) = event {
                tracing::info!(
                    order_id = e.order_id,
                    store_id = e.store_id,
                    customer_email = %e.customer_email,
                    old_status = %e.old_status,
                    new_status = %e.new_status,
                    "Order status notification"
                );
            }
        }
    })
}

/// Logs stock movements and raises alerts on low/out-of-stock transitions.
pub fn spawn_stock_alert_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe("stock-alert-logger", EventKind::StockUpdated);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let DomainEvent::StockUpdated(e) = event {
                log_stock_change(&e);
            }
        }
    })
}

fn log_stock_change(e: &StockUpdatedEvent) {
    if e.new_stock == 0 {
        tracing::error!(
            product_id = e.product_id,
            store_id = e.store_id,
            "Product is out of stock"
        );
    } else if crossed_low_stock(e.old_stock, e.new_stock) {
        tracing::warn!(
            product_id = e.product_id,
            store_id = e.store_id,
            stock = e.new_stock,
            "Product stock is low"
        );
    } else {
        tracing::debug!(
            product_id = e.product_id,
            old_stock = e.old_stock,
            new_stock = e.new_stock,
            "Stock updated"
        );
    }
}

/// True when this change moved the stock level into the alert band.
fn crossed_low_stock(old_stock: i64, new_stock: i64) -> bool {
    new_stock <= LOW_STOCK_ALERT_THRESHOLD && old_stock > LOW_STOCK_ALERT_THRESHOLD
}

/// Records a purchase analytics event for every new order.
pub fn spawn_purchase_tracker(bus: &EventBus, pool: PgPool) -> JoinHandle<()> {
    let mut rx = bus.subscribe("purchase-tracker", EventKind::NewOrder);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let DomainEvent::NewOrder(e) = event {
                track_purchase(&pool, &e).await;
            }
        }
    })
}

async fn track_purchase(pool: &PgPool, e: &NewOrderEvent) {
    let session_id = purchase_session_id(e.order_id);
    let row = db::analytics::InsertEvent {
        store_id: e.store_id,
        event_type: "purchase",
        product_id: None,
        user_id: e.customer_id.as_deref(),
        session_id: Some(&session_id),
        revenue: Some(e.total_amount),
        metadata: None,
        now: e.timestamp,
    };
    if let Err(err) = db::analytics::insert(pool, &row).await {
        tracing::error!(order_id = e.order_id, error = %err, "Failed to track purchase event");
    }
}

/// Session identifier linking a purchase event back to its order.
fn purchase_session_id(order_id: i64) -> String {
    format!("order-{order_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_stock_alert_fires_only_on_downward_crossing() {
        // Entering the alert band
        assert!(crossed_low_stock(6, 5));
        assert!(crossed_low_stock(100, 1));

        // Already inside the band: no repeated alert
        assert!(!crossed_low_stock(5, 4));
        assert!(!crossed_low_stock(3, 2));

        // Above the band
        assert!(!crossed_low_stock(10, 6));

        // Restocks never alert
        assert!(!crossed_low_stock(2, 50));
    }

    #[test]
    fn purchase_session_id_is_order_scoped() {
        assert_eq!(purchase_session_id(42), "order-42");
    }
}
