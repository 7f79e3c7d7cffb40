//! Store endpoints: create store, list my stores

use axum::{Extension, Json, extract::State};
use serde::Serialize;

use shared::error::{AppError, ErrorCode};
use shared::models::{Store, StoreCreate};
use shared::util::now_millis;

use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

use super::ApiResult;

/// POST /stores
pub async fn create_store(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<StoreCreate>,
) -> ApiResult<Store> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("Store name must not be empty").into());
    }
    if req.slug.trim().is_empty() || !is_valid_slug(&req.slug) {
        return Err(AppError::validation(
            "Slug must contain only lowercase letters, digits and hyphens",
        )
        .into());
    }

    if db::stores::slug_exists(&state.pool, &req.slug).await? {
        return Err(AppError::with_message(
            ErrorCode::SlugTaken,
            format!("Slug '{}' is already in use", req.slug),
        )
        .into());
    }

    let store = db::stores::create(
        &state.pool,
        &identity.user_id,
        &identity.email,
        &req,
        now_millis(),
    )
    .await?;

    tracing::info!(store_id = store.id, owner = %identity.user_id, slug = %store.slug, "Store created");
    Ok(Json(store))
}

#[derive(Serialize)]
pub struct ListStoresResponse {
    pub stores: Vec<Store>,
}

/// GET /stores
pub async fn list_stores(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<ListStoresResponse> {
    let stores = db::stores::list_for_user(&state.pool, &identity.user_id).await?;
    Ok(Json(ListStoresResponse { stores }))
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation() {
        assert!(is_valid_slug("coffee-shop"));
        assert!(is_valid_slug("store123"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Coffee"));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("under_score"));
    }
}
