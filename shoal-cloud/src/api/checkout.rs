//! Hosted checkout endpoint
//!
//! Validates the cart with the same rules as direct orders, then creates a
//! Stripe Checkout Session. No order row is written here; the order
//! materializes when `checkout.session.completed` arrives on the webhook.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use shared::error::{AppError, ErrorCode};
use shared::models::{CartLine, SubscriptionInterval};

use crate::auth::UserIdentity;
use crate::state::AppState;
use crate::{db, stripe};

use super::{ApiResult, cart};

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    /// Overrides the identity email on the Stripe payment page
    pub customer_email: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

/// POST /stores/{store_id}/checkout
pub async fn create_session(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(store_id): Path<i64>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    let store = db::stores::find_active(&state.pool, store_id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::StoreNotFound, "Store not found"))?;

    let validated = cart::validate_cart(&state.pool, store.id, &req.items).await?;

    let lines: Vec<stripe::CheckoutLine> = validated
        .lines
        .iter()
        .map(|l| stripe::CheckoutLine {
            name: l.product.name.clone(),
            description: l.product.description.clone(),
            currency: l.product.currency.clone(),
            unit_amount: l.product.price,
            quantity: l.quantity,
            recurring: l.product.is_subscription.then(|| {
                (
                    l.product.interval().unwrap_or(SubscriptionInterval::Month),
                    l.product.subscription_interval_count,
                )
            }),
        })
        .collect();

    // The webhook rebuilds the cart from this metadata
    let items_json = serde_json::to_string(&req.items)
        .map_err(|e| AppError::internal(format!("Failed to encode cart metadata: {e}")))?;

    let customer_email = req.customer_email.as_deref().unwrap_or(&identity.email);

    let session = stripe::create_checkout_session(
        &state.stripe_secret_key,
        &stripe::CheckoutSessionRequest {
            lines: &lines,
            success_url: req.success_url.as_deref().unwrap_or(&state.checkout_success_url),
            cancel_url: req.cancel_url.as_deref().unwrap_or(&state.checkout_cancel_url),
            customer_email: Some(customer_email),
            store_id: store.id,
            user_id: Some(&identity.user_id),
            items_json: &items_json,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(store_id = store.id, error = %e, "Stripe checkout session failed");
        AppError::new(ErrorCode::PaymentSetupFailed)
    })?;

    tracing::info!(
        store_id = store.id,
        session_id = %session.id,
        total_amount = validated.total_amount,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}
