//! Inventory endpoints: manual adjustment, low-stock report, sales history

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use shared::error::{AppError, ErrorCode};
use shared::events::{DomainEvent, StockUpdatedEvent};
use shared::models::Product;
use shared::util::now_millis;

use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, verify_member, verify_staff};

const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// How a manual adjustment combines with the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustOperation {
    Set,
    Add,
    Subtract,
}

#[derive(Deserialize)]
pub struct AdjustStockRequest {
    pub quantity: i64,
    pub operation: AdjustOperation,
}

#[derive(Serialize)]
pub struct AdjustStockResponse {
    pub product_id: i64,
    pub old_stock: i64,
    pub new_stock: i64,
}

/// POST /stores/{store_id}/inventory/{product_id}/adjust — staff only
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((store_id, product_id)): Path<(i64, i64)>,
    Json(req): Json<AdjustStockRequest>,
) -> ApiResult<AdjustStockResponse> {
    if req.quantity < 0 {
        return Err(AppError::validation("Quantity must not be negative").into());
    }

    verify_staff(&state, store_id, &identity.user_id).await?;

    db::products::find_in_store(&state.pool, store_id, product_id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::ProductNotFound, "Product not found"))?;

    let now = now_millis();
    let change = match req.operation {
        AdjustOperation::Set => {
            db::products::set_stock(&state.pool, product_id, req.quantity, now).await?
        }
        AdjustOperation::Add => {
            db::products::add_stock(&state.pool, product_id, req.quantity, now).await?
        }
        AdjustOperation::Subtract => Some(
            db::products::subtract_stock_checked(&state.pool, product_id, req.quantity, now)
                .await?
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::NegativeStock,
                        "Cannot subtract below zero stock",
                    )
                })?,
        ),
    };

    let change = change
        .ok_or_else(|| AppError::with_message(ErrorCode::ProductNotFound, "Product not found"))?;

    state
        .events
        .publish(DomainEvent::StockUpdated(StockUpdatedEvent {
            product_id,
            store_id,
            old_stock: change.old_stock,
            new_stock: change.new_stock,
            timestamp: now,
        }));

    tracing::info!(
        product_id,
        store_id,
        old_stock = change.old_stock,
        new_stock = change.new_stock,
        operation = ?req.operation,
        "Stock adjusted"
    );

    Ok(Json(AdjustStockResponse {
        product_id,
        old_stock: change.old_stock,
        new_stock: change.new_stock,
    }))
}

#[derive(Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

#[derive(Serialize)]
pub struct LowStockResponse {
    pub threshold: i64,
    pub products: Vec<Product>,
}

/// GET /stores/{store_id}/inventory/low-stock
pub async fn low_stock(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(store_id): Path<i64>,
    Query(query): Query<LowStockQuery>,
) -> ApiResult<LowStockResponse> {
    verify_member(&state, store_id, &identity.user_id).await?;

    let threshold = query
        .threshold
        .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
        .max(0);
    let products = db::products::list_low_stock(&state.pool, store_id, threshold).await?;

    Ok(Json(LowStockResponse {
        threshold,
        products,
    }))
}

#[derive(Serialize)]
pub struct StockHistoryResponse {
    pub product_id: i64,
    pub product_name: String,
    pub current_stock: Option<i64>,
    pub sales: Vec<db::orders::StockMovement>,
}

/// GET /stores/{store_id}/inventory/{product_id}/history
///
/// Sales-driven movements only; manual adjustments are visible in logs.
pub async fn stock_history(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((store_id, product_id)): Path<(i64, i64)>,
) -> ApiResult<StockHistoryResponse> {
    verify_member(&state, store_id, &identity.user_id).await?;

    let product = db::products::find_in_store(&state.pool, store_id, product_id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::ProductNotFound, "Product not found"))?;

    let sales = db::orders::product_sales(&state.pool, store_id, product_id, 100).await?;

    Ok(Json(StockHistoryResponse {
        product_id,
        product_name: product.name,
        current_stock: product.stock_quantity,
        sales,
    }))
}
