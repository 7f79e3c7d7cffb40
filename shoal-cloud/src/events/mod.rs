//! EventBus — in-process fan-out of domain events
//!
//! Publishers (order engine, inventory, payment reconciliation) emit
//! [`DomainEvent`]s; each subscriber gets its own unbounded channel, so a slow
//! or dead subscriber never blocks publishers or starves its siblings.
//!
//! Delivery guarantees:
//! - at-least-once per subscriber while the subscriber task is alive
//! - events of the same kind reach a subscriber in publish order
//! - no ordering promise across kinds
//! - a subscriber only receives events published after it subscribed

pub mod subscribers;

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use shared::events::DomainEvent;

/// The three event kinds subscribers can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    OrderStatusChanged,
    StockUpdated,
    NewOrder,
}

impl EventKind {
    fn of(event: &DomainEvent) -> Self {
        match event {
            DomainEvent::OrderStatusChanged(_) => EventKind::OrderStatusChanged,
            DomainEvent::StockUpdated(_) => EventKind::StockUpdated,
            DomainEvent::NewOrder(_) => EventKind::NewOrder,
        }
    }
}

struct Subscriber {
    name: &'static str,
    kind: EventKind,
    tx: mpsc::UnboundedSender<DomainEvent>,
}

/// Per-kind publish/subscribe hub, cheap to clone into handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for one event kind. The returned receiver sees
    /// every matching event published after this call.
    pub fn subscribe(
        &self,
        name: &'static str,
        kind: EventKind,
    ) -> mpsc::UnboundedReceiver<DomainEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .expect("event bus lock poisoned")
            .push(Subscriber { name, kind, tx });
        rx
    }

    /// Deliver an event to every subscriber of its kind.
    ///
    /// Subscribers whose receiver has been dropped are pruned; delivery to the
    /// rest is unaffected.
    pub fn publish(&self, event: DomainEvent) {
        let kind = EventKind::of(&event);
        let mut subs = self.subscribers.write().expect("event bus lock poisoned");
        subs.retain(|sub| {
            if sub.kind != kind {
                return true;
            }
            match sub.tx.send(event.clone()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::warn!(subscriber = sub.name, "Event subscriber gone, removing");
                    false
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::events::{NewOrderEvent, OrderStatusChangedEvent, StockUpdatedEvent};

    fn stock_event(product_id: i64, new_stock: i64) -> DomainEvent {
        DomainEvent::StockUpdated(StockUpdatedEvent {
            product_id,
            store_id: 1,
            old_stock: new_stock + 1,
            new_stock,
            timestamp: shared::util::now_millis(),
        })
    }

    fn order_event(order_id: i64) -> DomainEvent {
        DomainEvent::NewOrder(NewOrderEvent {
            order_id,
            store_id: 1,
            customer_id: None,
            customer_email: "c@example.com".into(),
            total_amount: 1000,
            timestamp: shared::util::now_millis(),
        })
    }

    fn status_event(order_id: i64) -> DomainEvent {
        DomainEvent::OrderStatusChanged(OrderStatusChangedEvent {
            order_id,
            store_id: 1,
            customer_id: Some("u1".into()),
            customer_email: "c@example.com".into(),
            old_status: "pending".into(),
            new_status: "paid".into(),
            timestamp: shared::util::now_millis(),
        })
    }

    #[tokio::test]
    async fn delivers_to_matching_kind_only() {
        let bus = EventBus::new();
        let mut stock_rx = bus.subscribe("stock", EventKind::StockUpdated);
        let mut order_rx = bus.subscribe("orders", EventKind::NewOrder);

        bus.publish(stock_event(7, 3));
        bus.publish(order_event(42));

        match stock_rx.recv().await.unwrap() {
            DomainEvent::StockUpdated(e) => assert_eq!(e.product_id, 7),
            other => panic!("Expected StockUpdated, got {other:?}"),
        }
        match order_rx.recv().await.unwrap() {
            DomainEvent::NewOrder(e) => assert_eq!(e.order_id, 42),
            other => panic!("Expected NewOrder, got {other:?}"),
        }

        // No cross-kind leakage
        assert!(stock_rx.try_recv().is_err());
        assert!(order_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn same_kind_events_arrive_in_publish_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe("stock", EventKind::StockUpdated);

        for i in 0..100 {
            bus.publish(stock_event(i, i));
        }

        for i in 0..100 {
            match rx.recv().await.unwrap() {
                DomainEvent::StockUpdated(e) => assert_eq!(e.product_id, i),
                other => panic!("Expected StockUpdated, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn every_subscriber_of_a_kind_gets_every_event() {
        let bus = EventBus::new();
        let mut a = bus.subscribe("a", EventKind::OrderStatusChanged);
        let mut b = bus.subscribe("b", EventKind::OrderStatusChanged);

        bus.publish(status_event(1));
        bus.publish(status_event(2));

        for rx in [&mut a, &mut b] {
            for expected in [1, 2] {
                match rx.recv().await.unwrap() {
                    DomainEvent::OrderStatusChanged(e) => assert_eq!(e.order_id, expected),
                    other => panic!("Expected OrderStatusChanged, got {other:?}"),
                }
            }
        }
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_affect_others() {
        let bus = EventBus::new();
        let dead = bus.subscribe("dead", EventKind::NewOrder);
        let mut alive = bus.subscribe("alive", EventKind::NewOrder);
        drop(dead);

        bus.publish(order_event(9));

        match alive.recv().await.unwrap() {
            DomainEvent::NewOrder(e) => assert_eq!(e.order_id, 9),
            other => panic!("Expected NewOrder, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.publish(order_event(1));

        let mut rx = bus.subscribe("late", EventKind::NewOrder);
        bus.publish(order_event(2));

        match rx.recv().await.unwrap() {
            DomainEvent::NewOrder(e) => assert_eq!(e.order_id, 2),
            other => panic!("Expected NewOrder, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
