//! Product and inventory queries
//!
//! Stock movements are single atomic UPDATEs that return firsthand old/new
//! values, so concurrent orders can never oversell a tracked product.

use sqlx::{PgConnection, PgPool};

use shared::models::Product;

/// Old/new stock pair returned by every stock mutation, feeds stock-updated
/// events.
#[derive(Debug, sqlx::FromRow)]
pub struct StockChange {
    pub old_stock: i64,
    pub new_stock: i64,
}

pub async fn find_in_store(
    pool: &PgPool,
    store_id: i64,
    product_id: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND store_id = $2")
        .bind(product_id)
        .bind(store_id)
        .fetch_optional(pool)
        .await
}

/// Conditionally decrement tracked stock. Returns `None` when the product is
/// untracked or has insufficient stock, leaving the row untouched — the order
/// transaction must then roll back.
pub async fn decrement_stock_checked(
    conn: &mut PgConnection,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> Result<Option<StockChange>, sqlx::Error> {
    sqlx::query_as::<_, StockChange>(
        "UPDATE products
         SET stock_quantity = stock_quantity - $2, updated_at = $3
         WHERE id = $1 AND stock_quantity IS NOT NULL AND stock_quantity >= $2
         RETURNING stock_quantity + $2 AS old_stock, stock_quantity AS new_stock",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await
}

/// Decrement tracked stock, flooring at zero. Used when reconciling a paid
/// checkout: the payment already settled, so an undersupply is logged rather
/// than rejected. Returns `None` for untracked products.
pub async fn decrement_stock_clamped(
    conn: &mut PgConnection,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> Result<Option<StockChange>, sqlx::Error> {
    sqlx::query_as::<_, StockChange>(
        "WITH prev AS (
             SELECT stock_quantity FROM products WHERE id = $1 AND stock_quantity IS NOT NULL
         )
         UPDATE products
         SET stock_quantity = GREATEST(stock_quantity - $2, 0), updated_at = $3
         WHERE id = $1 AND stock_quantity IS NOT NULL
         RETURNING (SELECT stock_quantity FROM prev) AS old_stock,
                   stock_quantity AS new_stock",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await
}

/// Set stock to an absolute level (manual adjustment). A previously untracked
/// product becomes tracked; the old level reports as 0.
pub async fn set_stock(
    pool: &PgPool,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> Result<Option<StockChange>, sqlx::Error> {
    sqlx::query_as::<_, StockChange>(
        "WITH prev AS (SELECT stock_quantity FROM products WHERE id = $1)
         UPDATE products SET stock_quantity = $2, updated_at = $3
         WHERE id = $1
         RETURNING COALESCE((SELECT stock_quantity FROM prev), 0) AS old_stock,
                   stock_quantity AS new_stock",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn add_stock(
    pool: &PgPool,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> Result<Option<StockChange>, sqlx::Error> {
    sqlx::query_as::<_, StockChange>(
        "WITH prev AS (SELECT stock_quantity FROM products WHERE id = $1)
         UPDATE products SET stock_quantity = COALESCE(stock_quantity, 0) + $2, updated_at = $3
         WHERE id = $1
         RETURNING COALESCE((SELECT stock_quantity FROM prev), 0) AS old_stock,
                   stock_quantity AS new_stock",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Manual subtraction. Refuses to go below zero; `None` means the current
/// level is smaller than `quantity`.
pub async fn subtract_stock_checked(
    pool: &PgPool,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> Result<Option<StockChange>, sqlx::Error> {
    sqlx::query_as::<_, StockChange>(
        "WITH prev AS (SELECT stock_quantity FROM products WHERE id = $1)
         UPDATE products SET stock_quantity = COALESCE(stock_quantity, 0) - $2, updated_at = $3
         WHERE id = $1 AND COALESCE(stock_quantity, 0) >= $2
         RETURNING COALESCE((SELECT stock_quantity FROM prev), 0) AS old_stock,
                   stock_quantity AS new_stock",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Active tracked products at or below the threshold, lowest first.
pub async fn list_low_stock(
    pool: &PgPool,
    store_id: i64,
    threshold: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT * FROM products
         WHERE store_id = $1 AND is_active = TRUE
           AND stock_quantity IS NOT NULL AND stock_quantity <= $2
         ORDER BY stock_quantity ASC, name ASC",
    )
    .bind(store_id)
    .bind(threshold)
    .fetch_all(pool)
    .await
}
