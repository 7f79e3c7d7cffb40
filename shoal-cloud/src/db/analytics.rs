//! Analytics ledger queries
//!
//! The ledger is append-only; dashboards aggregate at read time.

use sqlx::PgPool;

pub struct InsertEvent<'a> {
    pub store_id: i64,
    pub event_type: &'a str,
    pub product_id: Option<i64>,
    pub user_id: Option<&'a str>,
    pub session_id: Option<&'a str>,
    pub revenue: Option<i64>,
    pub metadata: Option<&'a serde_json::Value>,
    pub now: i64,
}

pub async fn insert(pool: &PgPool, event: &InsertEvent<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO analytics_events (store_id, event_type, product_id, user_id,
                                       session_id, revenue, metadata, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(event.store_id)
    .bind(event.event_type)
    .bind(event.product_id)
    .bind(event.user_id)
    .bind(event.session_id)
    .bind(event.revenue)
    .bind(event.metadata)
    .bind(event.now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Event count per type within the range
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct EventCount {
    pub event_type: String,
    pub count: i64,
}

pub async fn counts_by_type(
    pool: &PgPool,
    store_id: i64,
    from: i64,
    to: i64,
) -> Result<Vec<EventCount>, sqlx::Error> {
    sqlx::query_as::<_, EventCount>(
        "SELECT event_type, COUNT(*) AS count
         FROM analytics_events
         WHERE store_id = $1 AND created_at >= $2 AND created_at <= $3
         GROUP BY event_type",
    )
    .bind(store_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Purchase revenue summary within the range
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct RevenueSummary {
    pub total_revenue: i64,
    pub purchase_count: i64,
}

pub async fn revenue_summary(
    pool: &PgPool,
    store_id: i64,
    from: i64,
    to: i64,
) -> Result<RevenueSummary, sqlx::Error> {
    sqlx::query_as::<_, RevenueSummary>(
        "SELECT COALESCE(SUM(revenue), 0)::BIGINT AS total_revenue, COUNT(*) AS purchase_count
         FROM analytics_events
         WHERE store_id = $1 AND event_type = 'purchase'
           AND created_at >= $2 AND created_at <= $3",
    )
    .bind(store_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await
}

/// Per-product engagement within the range
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct ProductStats {
    pub product_id: i64,
    pub product_name: String,
    pub views: i64,
    pub clicks: i64,
}

pub async fn top_products(
    pool: &PgPool,
    store_id: i64,
    from: i64,
    to: i64,
    limit: i64,
) -> Result<Vec<ProductStats>, sqlx::Error> {
    sqlx::query_as::<_, ProductStats>(
        "SELECT ae.product_id, p.name AS product_name,
                COUNT(*) FILTER (WHERE ae.event_type = 'view') AS views,
                COUNT(*) FILTER (WHERE ae.event_type = 'click') AS clicks
         FROM analytics_events ae
         JOIN products p ON p.id = ae.product_id
         WHERE ae.store_id = $1 AND ae.product_id IS NOT NULL
           AND ae.created_at >= $2 AND ae.created_at <= $3
         GROUP BY ae.product_id, p.name
         ORDER BY views DESC, clicks DESC
         LIMIT $4",
    )
    .bind(store_id)
    .bind(from)
    .bind(to)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// One day of activity (UTC), for dashboard charts
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct DailyStats {
    pub day: String,
    pub views: i64,
    pub purchases: i64,
    pub revenue: i64,
}

pub async fn daily_stats(
    pool: &PgPool,
    store_id: i64,
    from: i64,
    to: i64,
) -> Result<Vec<DailyStats>, sqlx::Error> {
    sqlx::query_as::<_, DailyStats>(
        "SELECT to_char(to_timestamp(created_at / 1000) AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS day,
                COUNT(*) FILTER (WHERE event_type = 'view') AS views,
                COUNT(*) FILTER (WHERE event_type = 'purchase') AS purchases,
                COALESCE(SUM(revenue) FILTER (WHERE event_type = 'purchase'), 0)::BIGINT AS revenue
         FROM analytics_events
         WHERE store_id = $1 AND created_at >= $2 AND created_at <= $3
         GROUP BY day
         ORDER BY day",
    )
    .bind(store_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
