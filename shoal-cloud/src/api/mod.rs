//! API routes for shoal-cloud

pub mod analytics;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod inventory;
pub mod order;
pub mod store;
pub mod stripe_webhook;

use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use shared::error::{AppError, ErrorCode};

use crate::auth::user_auth_middleware;
use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, ServiceError>;

/// Verify that the user owns the store or holds any membership role.
/// Not-found and no-permission collapse into one answer on purpose.
pub async fn verify_member(
    state: &AppState,
    store_id: i64,
    user_id: &str,
) -> ServiceResult<()> {
    if !db::stores::is_member(&state.pool, store_id, user_id).await? {
        return Err(AppError::with_message(
            ErrorCode::StoreNotFound,
            "Store not found or access denied",
        )
        .into());
    }
    Ok(())
}

/// Verify that the user may mutate store data (owner or editor role).
pub async fn verify_staff(
    state: &AppState,
    store_id: i64,
    user_id: &str,
) -> ServiceResult<()> {
    if !db::stores::is_staff(&state.pool, store_id, user_id).await? {
        return Err(AppError::with_message(
            ErrorCode::StoreNotFound,
            "Store not found or access denied",
        )
        .into());
    }
    Ok(())
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Everything store-management and order-placement requires a user JWT
    let authed = Router::new()
        .route("/stores", post(store::create_store).get(store::list_stores))
        .route(
            "/stores/{store_id}/orders",
            post(order::create_order).get(order::list_orders),
        )
        .route("/stores/{store_id}/orders/{order_id}", get(order::get_order))
        .route(
            "/stores/{store_id}/orders/{order_id}/status",
            put(order::update_status),
        )
        .route("/stores/{store_id}/checkout", post(checkout::create_session))
        .route(
            "/stores/{store_id}/inventory/{product_id}/adjust",
            post(inventory::adjust_stock),
        )
        .route(
            "/stores/{store_id}/inventory/low-stock",
            get(inventory::low_stock),
        )
        .route(
            "/stores/{store_id}/inventory/{product_id}/history",
            get(inventory::stock_history),
        )
        .route("/stores/{store_id}/analytics", get(analytics::get_stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    // Stripe webhook (signature-verified, raw body) and anonymous tracking
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/webhooks/stripe", post(stripe_webhook::handle_webhook))
        .route(
            "/stores/{store_id}/analytics/track",
            post(analytics::track_event),
        );

    Router::new()
        .merge(public)
        .merge(authed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
