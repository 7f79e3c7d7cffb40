//! Store and membership queries

use sqlx::PgPool;

use shared::models::{Store, StoreCreate};

/// Find an active store by id. Inactive stores are invisible to the
/// order/checkout paths.
pub async fn find_active(pool: &PgPool, store_id: i64) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1 AND is_active = TRUE")
        .bind(store_id)
        .fetch_optional(pool)
        .await
}

pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM stores WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Create a store owned by `owner_id`, upserting the user row and the owner
/// membership in the same transaction.
pub async fn create(
    pool: &PgPool,
    owner_id: &str,
    owner_email: &str,
    store: &StoreCreate,
    now: i64,
) -> Result<Store, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, email, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, updated_at = EXCLUDED.updated_at",
    )
    .bind(owner_id)
    .bind(owner_email)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let created: Store = sqlx::query_as(
        "INSERT INTO stores (owner_id, name, slug, description, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, TRUE, $5, $5)
         RETURNING *",
    )
    .bind(owner_id)
    .bind(&store.name)
    .bind(&store.slug)
    .bind(&store.description)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO store_members (store_id, user_id, role, created_at)
         VALUES ($1, $2, 'owner', $3)",
    )
    .bind(created.id)
    .bind(owner_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(created)
}

/// Stores the user owns or is a member of, most recent first.
pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Store>, sqlx::Error> {
    sqlx::query_as::<_, Store>(
        "SELECT DISTINCT s.*
         FROM stores s
         LEFT JOIN store_members m ON m.store_id = s.id
         WHERE s.owner_id = $1 OR m.user_id = $1
         ORDER BY s.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// True when the user owns the store or holds any membership role.
pub async fn is_member(pool: &PgPool, store_id: i64, user_id: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT s.id FROM stores s
         LEFT JOIN store_members m ON m.store_id = s.id AND m.user_id = $2
         WHERE s.id = $1 AND (s.owner_id = $2 OR m.user_id IS NOT NULL)",
    )
    .bind(store_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// True when the user may mutate store data (owner, or owner/editor role).
pub async fn is_staff(pool: &PgPool, store_id: i64, user_id: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT s.id FROM stores s
         LEFT JOIN store_members m ON m.store_id = s.id AND m.user_id = $2
         WHERE s.id = $1
           AND (s.owner_id = $2 OR m.role IN ('owner', 'editor'))",
    )
    .bind(store_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}
