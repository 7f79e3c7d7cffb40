//! Analytics endpoints: anonymous event tracking, store dashboard stats

use axum::http::HeaderMap;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use shared::error::{AppError, ErrorCode};
use shared::models::{AnalyticsEventType, Product, TrackEvent};
use shared::util::now_millis;

use crate::auth::{UserIdentity, user_auth};
use crate::db;
use crate::state::AppState;

use super::{ApiResult, verify_member};

#[derive(Serialize)]
pub struct TrackResponse {
    pub tracked: bool,
}

/// A product id, when given, must have resolved within this store; events
/// pointing at another store's catalog are rejected. Only purchases carry
/// revenue.
fn resolve_event_fields(
    req: &TrackEvent,
    product: Option<&Product>,
) -> Result<Option<i64>, AppError> {
    if let Some(product_id) = req.product_id {
        if product.is_none() {
            return Err(AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product with ID {product_id} not found"),
            ));
        }
    }
    Ok(match req.event_type {
        AnalyticsEventType::Purchase => req.revenue,
        _ => None,
    })
}

/// POST /stores/{store_id}/analytics/track
///
/// No auth required — storefront visitors are anonymous. A bearer token, when
/// present and valid, attributes the event to the user; an invalid one is
/// simply ignored.
pub async fn track_event(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<TrackEvent>,
) -> ApiResult<TrackResponse> {
    db::stores::find_active(&state.pool, store_id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::StoreNotFound, "Store not found"))?;

    let product = match req.product_id {
        Some(id) => db::products::find_in_store(&state.pool, store_id, id).await?,
        None => None,
    };
    let revenue = resolve_event_fields(&req, product.as_ref())?;

    let identity = user_auth::try_identity(&headers, &state.jwt_secret);

    db::analytics::insert(
        &state.pool,
        &db::analytics::InsertEvent {
            store_id,
            event_type: req.event_type.as_db(),
            product_id: req.product_id,
            user_id: identity.as_ref().map(|i| i.user_id.as_str()),
            session_id: req.session_id.as_deref(),
            revenue,
            metadata: req.metadata.as_ref(),
            now: now_millis(),
        },
    )
    .await?;

    Ok(Json(TrackResponse { tracked: true }))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    /// Range start, epoch millis; defaults to 30 days ago
    pub from: Option<i64>,
    /// Range end, epoch millis; defaults to now
    pub to: Option<i64>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub from: i64,
    pub to: i64,
    pub counts: Vec<db::analytics::EventCount>,
    pub revenue: db::analytics::RevenueSummary,
    pub top_products: Vec<db::analytics::ProductStats>,
    pub daily: Vec<db::analytics::DailyStats>,
}

const THIRTY_DAYS_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// GET /stores/{store_id}/analytics
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(store_id): Path<i64>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<StatsResponse> {
    verify_member(&state, store_id, &identity.user_id).await?;

    let to = query.to.unwrap_or_else(now_millis);
    let from = query.from.unwrap_or(to - THIRTY_DAYS_MS);
    if from > to {
        return Err(AppError::validation("'from' must not be after 'to'").into());
    }

    let counts = db::analytics::counts_by_type(&state.pool, store_id, from, to).await?;
    let revenue = db::analytics::revenue_summary(&state.pool, store_id, from, to).await?;
    let top_products = db::analytics::top_products(&state.pool, store_id, from, to, 10).await?;
    let daily = db::analytics::daily_stats(&state.pool, store_id, from, to).await?;

    Ok(Json(StatsResponse {
        from,
        to,
        counts,
        revenue,
        top_products,
        daily,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64) -> Product {
        Product {
            id,
            store_id: 1,
            category_id: None,
            name: format!("Product {id}"),
            description: None,
            price: 1500,
            currency: "usd".to_string(),
            is_subscription: false,
            subscription_interval: None,
            subscription_interval_count: 1,
            stock_quantity: Some(10),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn track(event_type: AnalyticsEventType, product_id: Option<i64>) -> TrackEvent {
        TrackEvent {
            event_type,
            product_id,
            session_id: None,
            revenue: Some(2500),
            metadata: None,
        }
    }

    #[test]
    fn rejects_product_outside_the_store() {
        // A lookup scoped to the store came back empty, so the referenced
        // product either does not exist or belongs to another store.
        let req = track(AnalyticsEventType::View, Some(42));
        let err = resolve_event_fields(&req, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[test]
    fn accepts_event_without_product() {
        let req = track(AnalyticsEventType::Signup, None);
        assert_eq!(resolve_event_fields(&req, None).unwrap(), None);
    }

    #[test]
    fn revenue_only_recorded_for_purchases() {
        let p = product(42);
        let view = track(AnalyticsEventType::View, Some(42));
        assert_eq!(resolve_event_fields(&view, Some(&p)).unwrap(), None);

        let purchase = track(AnalyticsEventType::Purchase, Some(42));
        assert_eq!(resolve_event_fields(&purchase, Some(&p)).unwrap(), Some(2500));
    }
}
