//! Order queries
//!
//! Inserts run inside the caller's transaction so order rows, item rows and
//! stock decrements commit or roll back together.

use sqlx::{PgConnection, PgPool};

use shared::models::{Order, OrderItem, OrderItemDetail};

pub struct CreateOrder<'a> {
    pub store_id: i64,
    pub customer_id: Option<&'a str>,
    pub customer_email: &'a str,
    pub customer_name: Option<&'a str>,
    pub status: &'a str,
    pub total_amount: i64,
    pub currency: &'a str,
    pub stripe_session_id: Option<&'a str>,
    pub stripe_payment_intent_id: Option<&'a str>,
    pub shipping_address: Option<&'a serde_json::Value>,
    pub billing_address: Option<&'a serde_json::Value>,
    pub now: i64,
}

pub async fn insert(conn: &mut PgConnection, order: &CreateOrder<'_>) -> Result<Order, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "INSERT INTO orders (store_id, customer_id, customer_email, customer_name, status,
                             total_amount, currency, stripe_session_id, stripe_payment_intent_id,
                             shipping_address, billing_address, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
         RETURNING *",
    )
    .bind(order.store_id)
    .bind(order.customer_id)
    .bind(order.customer_email)
    .bind(order.customer_name)
    .bind(order.status)
    .bind(order.total_amount)
    .bind(order.currency)
    .bind(order.stripe_session_id)
    .bind(order.stripe_payment_intent_id)
    .bind(order.shipping_address)
    .bind(order.billing_address)
    .bind(order.now)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    unit_price: i64,
    now: i64,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price, total_price, created_at)
         VALUES ($1, $2, $3, $4, $3 * $4, $5)
         RETURNING *",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

/// Items for one order, with product name/description snapshots joined in.
pub async fn list_items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItemDetail>, sqlx::Error> {
    sqlx::query_as::<_, OrderItemDetail>(
        "SELECT oi.*, p.name AS product_name, p.description AS product_description
         FROM order_items oi
         JOIN products p ON p.id = oi.product_id
         WHERE oi.order_id = $1
         ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}

/// Items for a page of orders in one round trip.
pub async fn list_items_for_orders(
    pool: &PgPool,
    order_ids: &[i64],
) -> Result<Vec<OrderItemDetail>, sqlx::Error> {
    sqlx::query_as::<_, OrderItemDetail>(
        "SELECT oi.*, p.name AS product_name, p.description AS product_description
         FROM order_items oi
         JOIN products p ON p.id = oi.product_id
         WHERE oi.order_id = ANY($1)
         ORDER BY oi.order_id, oi.id",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await
}

/// One page of a store's orders, newest first, optionally filtered by status.
pub async fn list_page(
    pool: &PgPool,
    store_id: i64,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders
         WHERE store_id = $1 AND ($2::TEXT IS NULL OR status = $2)
         ORDER BY created_at DESC
         LIMIT $3 OFFSET $4",
    )
    .bind(store_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(
    pool: &PgPool,
    store_id: i64,
    status: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders
         WHERE store_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
    )
    .bind(store_id)
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Fetch one order visible to `user_id`: store staff see every order, a
/// customer only their own. Not-found and no-permission are deliberately
/// indistinguishable.
pub async fn find_for_user(
    pool: &PgPool,
    store_id: i64,
    order_id: i64,
    user_id: &str,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "SELECT o.* FROM orders o
         JOIN stores s ON s.id = o.store_id
         LEFT JOIN store_members m ON m.store_id = s.id AND m.user_id = $3
         WHERE o.id = $1 AND o.store_id = $2
           AND (s.owner_id = $3 OR m.user_id IS NOT NULL OR o.customer_id = $3)",
    )
    .bind(order_id)
    .bind(store_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_in_store(
    pool: &PgPool,
    store_id: i64,
    order_id: i64,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND store_id = $2")
        .bind(order_id)
        .bind(store_id)
        .fetch_optional(pool)
        .await
}

/// An updated order together with the status it held before the update.
#[derive(Debug, sqlx::FromRow)]
pub struct StatusTransition {
    #[sqlx(flatten)]
    pub order: Order,
    pub old_status: String,
}

/// Unconditionally move an order to `status`, reporting the previous status.
/// Any transition is allowed; the store decides its own fulfilment flow.
pub async fn update_status(
    pool: &PgPool,
    store_id: i64,
    order_id: i64,
    status: &str,
    now: i64,
) -> Result<Option<StatusTransition>, sqlx::Error> {
    sqlx::query_as::<_, StatusTransition>(
        "UPDATE orders o
         SET status = $3, updated_at = $4
         FROM orders prev
         WHERE o.id = $1 AND o.store_id = $2 AND prev.id = o.id
         RETURNING o.*, prev.status AS old_status",
    )
    .bind(order_id)
    .bind(store_id)
    .bind(status)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Mark every not-yet-paid order carrying this payment intent as paid.
/// Already-paid orders are skipped so replayed webhooks change nothing.
pub async fn mark_paid_by_intent(
    pool: &PgPool,
    payment_intent_id: &str,
    now: i64,
) -> Result<Vec<StatusTransition>, sqlx::Error> {
    sqlx::query_as::<_, StatusTransition>(
        "UPDATE orders o
         SET status = 'paid', updated_at = $2
         FROM orders prev
         WHERE prev.id = o.id AND o.stripe_payment_intent_id = $1 AND o.status <> 'paid'
         RETURNING o.*, prev.status AS old_status",
    )
    .bind(payment_intent_id)
    .bind(now)
    .fetch_all(pool)
    .await
}

/// One sale of a product, as seen from the inventory history view.
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct StockMovement {
    pub order_id: i64,
    pub quantity: i64,
    pub order_status: String,
    pub customer_email: String,
    pub created_at: i64,
}

pub async fn product_sales(
    pool: &PgPool,
    store_id: i64,
    product_id: i64,
    limit: i64,
) -> Result<Vec<StockMovement>, sqlx::Error> {
    sqlx::query_as::<_, StockMovement>(
        "SELECT oi.order_id, oi.quantity, o.status AS order_status,
                o.customer_email, oi.created_at
         FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         WHERE oi.product_id = $1 AND o.store_id = $2
         ORDER BY oi.created_at DESC
         LIMIT $3",
    )
    .bind(product_id)
    .bind(store_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
