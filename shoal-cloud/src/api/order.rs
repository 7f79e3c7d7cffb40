//! Order endpoints: place order, list, detail, status update

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use shared::error::{AppError, ErrorCode};
use shared::events::{DomainEvent, NewOrderEvent, OrderStatusChangedEvent, StockUpdatedEvent};
use shared::models::{
    Order, OrderCreate, OrderItemDetail, OrderStatus, OrderWithItems,
};
use shared::util::now_millis;

use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, cart, verify_member, verify_staff};

/// POST /stores/{store_id}/orders
///
/// Validates the cart, then writes the order, its items and every stock
/// decrement in one transaction. Events are published only after commit.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(store_id): Path<i64>,
    Json(req): Json<OrderCreate>,
) -> ApiResult<OrderWithItems> {
    let store = db::stores::find_active(&state.pool, store_id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::StoreNotFound, "Store not found"))?;

    if req.customer_email.trim().is_empty() {
        return Err(AppError::validation("Customer email is required").into());
    }

    let validated = cart::validate_cart(&state.pool, store.id, &req.items).await?;
    let now = now_millis();

    let mut tx = state.pool.begin().await?;

    let order = db::orders::insert(
        &mut *tx,
        &db::orders::CreateOrder {
            store_id: store.id,
            customer_id: Some(&identity.user_id),
            customer_email: &req.customer_email,
            customer_name: req.customer_name.as_deref(),
            status: OrderStatus::Pending.as_db(),
            total_amount: validated.total_amount,
            currency: &validated.currency,
            stripe_session_id: None,
            stripe_payment_intent_id: None,
            shipping_address: req.shipping_address.as_ref(),
            billing_address: req.billing_address.as_ref(),
            now,
        },
    )
    .await?;

    let mut items = Vec::with_capacity(validated.lines.len());
    let mut stock_changes = Vec::new();

    for line in &validated.lines {
        let item = db::orders::insert_item(
            &mut *tx,
            order.id,
            line.product.id,
            line.quantity,
            line.product.price,
            now,
        )
        .await?;
        items.push(OrderItemDetail {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
            created_at: item.created_at,
            product_name: line.product.name.clone(),
            product_description: line.product.description.clone(),
        });

        // Tracked products decrement conditionally; a concurrent order may
        // have taken the remaining stock since validation.
        if line.product.stock_quantity.is_some() {
            match db::products::decrement_stock_checked(&mut *tx, line.product.id, line.quantity, now)
                .await?
            {
                Some(change) => stock_changes.push((line.product.id, change)),
                None => {
                    tx.rollback().await?;
                    return Err(AppError::with_message(
                        ErrorCode::InsufficientStock,
                        format!("Insufficient stock for product {}", line.product.name),
                    )
                    .into());
                }
            }
        }
    }

    tx.commit().await?;

    for (product_id, change) in &stock_changes {
        state.events.publish(DomainEvent::StockUpdated(StockUpdatedEvent {
            product_id: *product_id,
            store_id: store.id,
            old_stock: change.old_stock,
            new_stock: change.new_stock,
            timestamp: now,
        }));
    }
    state.events.publish(DomainEvent::NewOrder(NewOrderEvent {
        order_id: order.id,
        store_id: store.id,
        customer_id: order.customer_id.clone(),
        customer_email: order.customer_email.clone(),
        total_amount: order.total_amount,
        timestamp: now,
    }));

    tracing::info!(
        order_id = order.id,
        store_id = store.id,
        total_amount = order.total_amount,
        "Order created"
    );

    Ok(Json(OrderWithItems { order, items }))
}

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderWithItems>,
    pub total: i64,
}

/// GET /stores/{store_id}/orders — any store member
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(store_id): Path<i64>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<ListOrdersResponse> {
    verify_member(&state, store_id, &identity.user_id).await?;

    if let Some(status) = query.status.as_deref() {
        if OrderStatus::from_db(status).is_none() {
            return Err(AppError::with_message(
                ErrorCode::OrderStatusInvalid,
                format!("Unknown order status '{status}'"),
            )
            .into());
        }
    }

    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let rows = db::orders::list_page(
        &state.pool,
        store_id,
        query.status.as_deref(),
        per_page,
        offset,
    )
    .await?;
    let total = db::orders::count(&state.pool, store_id, query.status.as_deref()).await?;

    let order_ids: Vec<i64> = rows.iter().map(|o| o.id).collect();
    let all_items = db::orders::list_items_for_orders(&state.pool, &order_ids).await?;

    let mut items_by_order: std::collections::HashMap<i64, Vec<OrderItemDetail>> =
        std::collections::HashMap::new();
    for item in all_items {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let orders = rows
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect();

    Ok(Json(ListOrdersResponse { orders, total }))
}

/// GET /stores/{store_id}/orders/{order_id}
///
/// Staff see every order; a customer only their own.
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((store_id, order_id)): Path<(i64, i64)>,
) -> ApiResult<OrderWithItems> {
    let order = db::orders::find_for_user(&state.pool, store_id, order_id, &identity.user_id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::OrderNotFound, "Order not found"))?;

    let items = db::orders::list_items(&state.pool, order.id).await?;
    Ok(Json(OrderWithItems { order, items }))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Whether `to` may overwrite `from`. Deliberately unguarded: stores drive
/// their own fulfilment flow, and staff must be able to rewind a terminal
/// state set by mistake, so there is no transition graph.
fn status_overwrite_allowed(_from: &str, _to: OrderStatus) -> bool {
    true
}

/// PUT /stores/{store_id}/orders/{order_id}/status — staff only
pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((store_id, order_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Order> {
    let status = OrderStatus::from_db(&req.status).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::OrderStatusInvalid,
            format!("Unknown order status '{}'", req.status),
        )
    })?;

    verify_staff(&state, store_id, &identity.user_id).await?;

    let existing = db::orders::find_in_store(&state.pool, store_id, order_id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::OrderNotFound, "Order not found"))?;
    if !status_overwrite_allowed(&existing.status, status) {
        return Err(AppError::with_message(
            ErrorCode::OrderStatusInvalid,
            format!("Cannot move order from '{}' to '{}'", existing.status, req.status),
        )
        .into());
    }

    let now = now_millis();
    let transition =
        db::orders::update_status(&state.pool, store_id, order_id, status.as_db(), now)
            .await?
            .ok_or_else(|| AppError::with_message(ErrorCode::OrderNotFound, "Order not found"))?;

    // Publish even for no-op transitions; subscribers dedupe if they care
    state
        .events
        .publish(DomainEvent::OrderStatusChanged(OrderStatusChangedEvent {
            order_id: transition.order.id,
            store_id,
            customer_id: transition.order.customer_id.clone(),
            customer_email: transition.order.customer_email.clone(),
            old_status: transition.old_status.clone(),
            new_status: transition.order.status.clone(),
            timestamp: now,
        }));

    tracing::info!(
        order_id,
        store_id,
        from = %transition.old_status,
        to = %transition.order.status,
        "Order status updated"
    );

    Ok(Json(transition.order))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    #[test]
    fn any_status_may_overwrite_any_prior_status() {
        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                assert!(
                    status_overwrite_allowed(from.as_db(), to),
                    "{} -> {} must be allowed",
                    from.as_db(),
                    to.as_db()
                );
            }
        }
    }

    #[test]
    fn terminal_states_are_not_sticky() {
        // Staff rewinding a mis-set terminal state is a supported flow.
        assert!(status_overwrite_allowed("delivered", OrderStatus::Pending));
        assert!(status_overwrite_allowed("cancelled", OrderStatus::Paid));
        assert!(status_overwrite_allowed("refunded", OrderStatus::Shipped));
    }
}
