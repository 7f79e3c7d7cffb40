//! Stripe webhook handler
//!
//! POST /webhooks/stripe — payment reconciliation (raw body for signature
//! verification). Once the signature checks out the endpoint always answers
//! 200: handler failures are logged and left to Stripe's retry schedule, and
//! replays are absorbed by idempotent writes (paid-stays-paid, upserts).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use shared::events::{DomainEvent, NewOrderEvent, OrderStatusChangedEvent, StockUpdatedEvent};
use shared::models::{CartLine, OrderStatus};
use shared::util::now_millis;

use crate::state::AppState;
use crate::{db, stripe};

/// Handle incoming Stripe webhook events
///
/// Must receive the raw body (not JSON) for HMAC signature verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let sig_header = match headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    {
        Some(s) => s,
        None => {
            tracing::warn!("Missing Stripe-Signature header");
            return StatusCode::BAD_REQUEST;
        }
    };

    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, &state.stripe_webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    tracing::info!(event_type = event_type, "Received Stripe webhook");

    match event_type {
        "checkout.session.completed" => handle_checkout_completed(&state, &event).await,
        "payment_intent.succeeded" => handle_payment_intent_succeeded(&state, &event).await,
        "invoice.payment_succeeded" => handle_invoice_payment_succeeded(&state, &event).await,
        "customer.subscription.created" => handle_subscription_created(&state, &event).await,
        "customer.subscription.updated" => handle_subscription_updated(&state, &event).await,
        "customer.subscription.deleted" => handle_subscription_deleted(&state, &event).await,
        _ => {
            tracing::debug!(event_type = event_type, "Unhandled webhook event type");
        }
    }

    StatusCode::OK
}

/// Cart metadata we attach when creating the checkout session. Stripe
/// metadata values are strings, so everything needs re-parsing.
#[derive(Debug, PartialEq)]
struct CheckoutMetadata {
    store_id: i64,
    user_id: Option<String>,
    items: Vec<CartLine>,
}

fn parse_checkout_metadata(obj: &serde_json::Value) -> Option<CheckoutMetadata> {
    let metadata = obj.get("metadata")?;
    let store_id = metadata["store_id"].as_str()?.parse().ok()?;
    let items: Vec<CartLine> = serde_json::from_str(metadata["items"].as_str()?).ok()?;
    let user_id = metadata["user_id"].as_str().map(String::from);
    Some(CheckoutMetadata {
        store_id,
        user_id,
        items,
    })
}

/// checkout.session.completed → materialize a paid order from the session
/// metadata, decrementing stock (floored at zero — the payment already
/// settled, so undersupply is logged, not rejected).
async fn handle_checkout_completed(state: &AppState, event: &serde_json::Value) {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return,
    };

    let session_id = obj["id"].as_str().unwrap_or("");
    let meta = match parse_checkout_metadata(obj) {
        Some(m) => m,
        None => {
            tracing::error!(
                session_id = session_id,
                "checkout.session.completed with missing or malformed cart metadata, dropping"
            );
            return;
        }
    };

    let customer_email = obj["customer_details"]["email"].as_str().unwrap_or("");
    let customer_name = obj["customer_details"]["name"].as_str();
    let payment_intent = obj["payment_intent"].as_str();
    let currency = obj["currency"].as_str().unwrap_or("usd");
    let now = now_millis();

    let result = create_order_from_session(
        state,
        &meta,
        session_id,
        payment_intent,
        customer_email,
        customer_name,
        obj["amount_total"].as_i64(),
        currency,
        now,
    )
    .await;

    match result {
        Ok(Some((order_id, total_amount, stock_changes))) => {
            for (product_id, change) in &stock_changes {
                state
                    .events
                    .publish(DomainEvent::StockUpdated(StockUpdatedEvent {
                        product_id: *product_id,
                        store_id: meta.store_id,
                        old_stock: change.old_stock,
                        new_stock: change.new_stock,
                        timestamp: now,
                    }));
            }
            state.events.publish(DomainEvent::NewOrder(NewOrderEvent {
                order_id,
                store_id: meta.store_id,
                customer_id: meta.user_id.clone(),
                customer_email: customer_email.to_string(),
                total_amount,
                timestamp: now,
            }));
            tracing::info!(
                order_id,
                store_id = meta.store_id,
                session_id = session_id,
                "Order created from checkout session"
            );
        }
        Ok(None) => {
            tracing::error!(
                session_id = session_id,
                store_id = meta.store_id,
                "No resolvable products in checkout metadata, order dropped"
            );
        }
        Err(e) => {
            tracing::error!(session_id = session_id, error = %e, "Failed to create order from checkout");
        }
    }
}

type StockChanges = Vec<(i64, db::products::StockChange)>;

#[allow(clippy::too_many_arguments)]
async fn create_order_from_session(
    state: &AppState,
    meta: &CheckoutMetadata,
    session_id: &str,
    payment_intent: Option<&str>,
    customer_email: &str,
    customer_name: Option<&str>,
    amount_total: Option<i64>,
    currency: &str,
    now: i64,
) -> Result<Option<(i64, i64, StockChanges)>, sqlx::Error> {
    // Resolve each metadata line; products deleted since checkout are skipped
    let mut resolved = Vec::new();
    let mut computed_total = 0i64;
    for line in &meta.items {
        match db::products::find_in_store(&state.pool, meta.store_id, line.product_id).await? {
            Some(product) => {
                computed_total += product.price * line.quantity;
                resolved.push((product, line.quantity));
            }
            None => {
                tracing::warn!(
                    product_id = line.product_id,
                    store_id = meta.store_id,
                    "Checkout line references unknown product, skipping"
                );
            }
        }
    }
    if resolved.is_empty() {
        return Ok(None);
    }

    let total_amount = amount_total.unwrap_or(computed_total);

    let mut tx = state.pool.begin().await?;

    let order = db::orders::insert(
        &mut *tx,
        &db::orders::CreateOrder {
            store_id: meta.store_id,
            customer_id: meta.user_id.as_deref(),
            customer_email,
            customer_name,
            status: OrderStatus::Paid.as_db(),
            total_amount,
            currency,
            stripe_session_id: Some(session_id),
            stripe_payment_intent_id: payment_intent,
            shipping_address: None,
            billing_address: None,
            now,
        },
    )
    .await?;

    let mut stock_changes = Vec::new();
    for (product, quantity) in &resolved {
        db::orders::insert_item(&mut *tx, order.id, product.id, *quantity, product.price, now)
            .await?;

        if let Some(stock) = product.stock_quantity {
            if let Some(change) =
                db::products::decrement_stock_clamped(&mut *tx, product.id, *quantity, now).await?
            {
                if stock < *quantity {
                    tracing::warn!(
                        product_id = product.id,
                        stock,
                        quantity,
                        "Paid order exceeds tracked stock, clamped to zero"
                    );
                }
                stock_changes.push((product.id, change));
            }
        }
    }

    tx.commit().await?;
    Ok(Some((order.id, total_amount, stock_changes)))
}

/// payment_intent.succeeded → flip matching orders to paid
async fn handle_payment_intent_succeeded(state: &AppState, event: &serde_json::Value) {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return,
    };
    let intent_id = match obj["id"].as_str() {
        Some(s) => s,
        None => {
            tracing::warn!("payment_intent.succeeded missing id");
            return;
        }
    };

    let now = now_millis();
    match db::orders::mark_paid_by_intent(&state.pool, intent_id, now).await {
        Ok(transitions) => {
            for t in transitions {
                state
                    .events
                    .publish(DomainEvent::OrderStatusChanged(OrderStatusChangedEvent {
                        order_id: t.order.id,
                        store_id: t.order.store_id,
                        customer_id: t.order.customer_id.clone(),
                        customer_email: t.order.customer_email.clone(),
                        old_status: t.old_status,
                        new_status: t.order.status,
                        timestamp: now,
                    }));
            }
        }
        Err(e) => {
            tracing::error!(intent_id = intent_id, error = %e, "Failed to mark orders paid");
        }
    }
}

/// invoice.payment_succeeded → keep the mirrored subscription active
async fn handle_invoice_payment_succeeded(state: &AppState, event: &serde_json::Value) {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return,
    };
    let sub_id = match obj["subscription"].as_str() {
        Some(s) => s,
        None => return, // one-off invoice, nothing to mirror
    };

    if let Err(e) =
        db::subscriptions::update_status(&state.pool, sub_id, "active", now_millis()).await
    {
        tracing::error!(subscription_id = sub_id, error = %e, "Failed to update subscription");
    }
}

fn secs_to_millis(v: &serde_json::Value) -> Option<i64> {
    v.as_i64().map(|s| s * 1000)
}

/// customer.subscription.created → insert the mirror row. Creation events
/// carry our checkout metadata, so the store link comes from there.
async fn handle_subscription_created(state: &AppState, event: &serde_json::Value) {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return,
    };
    let sub_id = match obj["id"].as_str() {
        Some(s) => s,
        None => {
            tracing::warn!("Subscription event missing id");
            return;
        }
    };

    let metadata = &obj["metadata"];
    let store_id = match metadata["store_id"].as_str().and_then(|s| s.parse().ok()) {
        Some(id) => id,
        None => {
            tracing::warn!(
                subscription_id = sub_id,
                "Subscription without store_id metadata, skipping"
            );
            return;
        }
    };

    let row = db::subscriptions::UpsertSubscription {
        store_id,
        product_id: metadata["product_id"].as_str().and_then(|s| s.parse().ok()),
        customer_id: metadata["user_id"].as_str(),
        customer_email: obj["customer_email"].as_str(),
        stripe_subscription_id: sub_id,
        status: obj["status"].as_str().unwrap_or("active"),
        current_period_start: secs_to_millis(&obj["current_period_start"]),
        current_period_end: secs_to_millis(&obj["current_period_end"]),
        cancel_at_period_end: obj["cancel_at_period_end"].as_bool().unwrap_or(false),
        now: now_millis(),
    };

    if let Err(e) = db::subscriptions::upsert(&state.pool, &row).await {
        tracing::error!(subscription_id = sub_id, error = %e, "Failed to upsert subscription");
    }
}

/// Lifecycle fields of a subscription event, keyed by the Stripe id alone.
/// Events raised by dashboard edits or renewals carry no checkout metadata,
/// so nothing beyond the object id may be required here.
#[derive(Debug, PartialEq)]
struct SubscriptionPatch {
    stripe_subscription_id: String,
    status: String,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    cancel_at_period_end: bool,
}

fn parse_subscription_patch(obj: &serde_json::Value) -> Option<SubscriptionPatch> {
    let sub_id = obj["id"].as_str()?;
    Some(SubscriptionPatch {
        stripe_subscription_id: sub_id.to_string(),
        status: obj["status"].as_str().unwrap_or("active").to_string(),
        current_period_start: secs_to_millis(&obj["current_period_start"]),
        current_period_end: secs_to_millis(&obj["current_period_end"]),
        cancel_at_period_end: obj["cancel_at_period_end"].as_bool().unwrap_or(false),
    })
}

/// customer.subscription.updated → patch status, billing period and
/// cancellation flag on the mirror row
async fn handle_subscription_updated(state: &AppState, event: &serde_json::Value) {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return,
    };
    let patch = match parse_subscription_patch(obj) {
        Some(p) => p,
        None => {
            tracing::warn!("Subscription event missing id");
            return;
        }
    };

    if let Err(e) = db::subscriptions::update_periods(
        &state.pool,
        &patch.stripe_subscription_id,
        &patch.status,
        patch.current_period_start,
        patch.current_period_end,
        patch.cancel_at_period_end,
        now_millis(),
    )
    .await
    {
        tracing::error!(
            subscription_id = %patch.stripe_subscription_id,
            error = %e,
            "Failed to update subscription"
        );
    }
}

/// customer.subscription.deleted → mark canceled, keep the row for history
async fn handle_subscription_deleted(state: &AppState, event: &serde_json::Value) {
    let obj = match event.get("data").and_then(|d| d.get("object")) {
        Some(o) => o,
        None => return,
    };
    let sub_id = match obj["id"].as_str() {
        Some(s) => s,
        None => return,
    };

    if let Err(e) =
        db::subscriptions::update_status(&state.pool, sub_id, "canceled", now_millis()).await
    {
        tracing::error!(subscription_id = sub_id, error = %e, "Failed to cancel subscription");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_checkout_metadata() {
        let obj = json!({
            "id": "cs_test_1",
            "metadata": {
                "store_id": "7",
                "user_id": "user_1",
                "items": "[{\"product_id\":10,\"quantity\":2},{\"product_id\":11,\"quantity\":1}]"
            }
        });

        let meta = parse_checkout_metadata(&obj).unwrap();
        assert_eq!(meta.store_id, 7);
        assert_eq!(meta.user_id.as_deref(), Some("user_1"));
        assert_eq!(meta.items.len(), 2);
        assert_eq!(meta.items[0].product_id, 10);
        assert_eq!(meta.items[0].quantity, 2);
    }

    #[test]
    fn anonymous_checkout_has_no_user() {
        let obj = json!({
            "metadata": {
                "store_id": "7",
                "items": "[{\"product_id\":10,\"quantity\":1}]"
            }
        });

        let meta = parse_checkout_metadata(&obj).unwrap();
        assert_eq!(meta.user_id, None);
    }

    #[test]
    fn rejects_missing_or_malformed_metadata() {
        assert!(parse_checkout_metadata(&json!({})).is_none());
        assert!(parse_checkout_metadata(&json!({ "metadata": {} })).is_none());
        assert!(
            parse_checkout_metadata(&json!({
                "metadata": { "store_id": "not-a-number", "items": "[]" }
            }))
            .is_none()
        );
        assert!(
            parse_checkout_metadata(&json!({
                "metadata": { "store_id": "7", "items": "not-json" }
            }))
            .is_none()
        );
    }

    #[test]
    fn subscription_update_needs_no_metadata() {
        // Renewal and dashboard-edit events carry no checkout metadata;
        // the patch must still resolve from the object id alone.
        let obj = json!({
            "id": "sub_123",
            "status": "past_due",
            "current_period_start": 1_700_000_000,
            "current_period_end": 1_702_592_000,
            "cancel_at_period_end": true
        });

        let patch = parse_subscription_patch(&obj).unwrap();
        assert_eq!(
            patch,
            SubscriptionPatch {
                stripe_subscription_id: "sub_123".to_string(),
                status: "past_due".to_string(),
                current_period_start: Some(1_700_000_000_000),
                current_period_end: Some(1_702_592_000_000),
                cancel_at_period_end: true,
            }
        );
    }

    #[test]
    fn subscription_patch_requires_only_the_id() {
        let patch = parse_subscription_patch(&json!({ "id": "sub_1" })).unwrap();
        assert_eq!(patch.status, "active");
        assert_eq!(patch.current_period_start, None);
        assert!(!patch.cancel_at_period_end);

        assert!(parse_subscription_patch(&json!({ "status": "active" })).is_none());
    }

    #[test]
    fn converts_stripe_period_seconds_to_millis() {
        assert_eq!(secs_to_millis(&json!(1_700_000_000)), Some(1_700_000_000_000));
        assert_eq!(secs_to_millis(&json!(null)), None);
        assert_eq!(secs_to_millis(&json!("nope")), None);
    }
}
