//! Cart validation shared by direct orders and hosted checkout
//!
//! Both entry points call [`validate_cart`], so a cart that is rejected for a
//! direct order is rejected for checkout with the same error, and totals agree
//! to the cent.

use sqlx::PgPool;

use shared::error::{AppError, ErrorCode};
use shared::models::{CartLine, Product};

use crate::db;
use crate::error::ServiceResult;

/// One cart line resolved against the live catalog.
#[derive(Debug)]
pub struct ValidatedLine {
    pub product: Product,
    pub quantity: i64,
    /// `product.price * quantity`, minor units
    pub line_total: i64,
}

#[derive(Debug)]
pub struct ValidatedCart {
    pub lines: Vec<ValidatedLine>,
    /// Sum of line totals, minor units
    pub total_amount: i64,
    pub currency: String,
}

/// Check one line against its catalog row. `product` is `None` when the id
/// did not resolve within the store.
fn check_line(product: Option<Product>, line: &CartLine) -> Result<ValidatedLine, AppError> {
    let product = product.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::ProductNotFound,
            format!("Product with ID {} not found", line.product_id),
        )
    })?;

    if line.quantity <= 0 {
        return Err(AppError::validation(format!(
            "Quantity for product {} must be positive",
            product.name
        )));
    }

    if !product.is_active {
        return Err(AppError::with_message(
            ErrorCode::ProductInactive,
            format!("Product {} is not available", product.name),
        ));
    }

    if let Some(stock) = product.stock_quantity {
        if stock < line.quantity {
            return Err(AppError::with_message(
                ErrorCode::InsufficientStock,
                format!("Insufficient stock for product {}", product.name),
            ));
        }
    }

    let line_total = product.price * line.quantity;
    Ok(ValidatedLine {
        product,
        quantity: line.quantity,
        line_total,
    })
}

/// Resolve and validate a whole cart against one store's catalog.
pub async fn validate_cart(
    pool: &PgPool,
    store_id: i64,
    items: &[CartLine],
) -> ServiceResult<ValidatedCart> {
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).into());
    }

    let mut lines = Vec::with_capacity(items.len());
    let mut total_amount = 0i64;
    for item in items {
        let product = db::products::find_in_store(pool, store_id, item.product_id).await?;
        let line = check_line(product, item)?;
        total_amount += line.line_total;
        lines.push(line);
    }

    let currency = lines[0].product.currency.clone();
    Ok(ValidatedCart {
        lines,
        total_amount,
        currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price: i64, stock: Option<i64>, active: bool) -> Product {
        Product {
            id,
            store_id: 1,
            category_id: None,
            name: format!("product-{id}"),
            description: None,
            price,
            currency: "usd".into(),
            is_subscription: false,
            subscription_interval: None,
            subscription_interval_count: 1,
            stock_quantity: stock,
            is_active: active,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn line(product_id: i64, quantity: i64) -> CartLine {
        CartLine {
            product_id,
            quantity,
        }
    }

    #[test]
    fn accepts_tracked_product_with_enough_stock() {
        let v = check_line(Some(product(1, 500, Some(10), true)), &line(1, 3)).unwrap();
        assert_eq!(v.line_total, 1500);
        assert_eq!(v.quantity, 3);
    }

    #[test]
    fn accepts_untracked_product_at_any_quantity() {
        let v = check_line(Some(product(1, 500, None, true)), &line(1, 10_000)).unwrap();
        assert_eq!(v.line_total, 5_000_000);
    }

    #[test]
    fn exact_stock_is_enough() {
        assert!(check_line(Some(product(1, 100, Some(4), true)), &line(1, 4)).is_ok());
    }

    #[test]
    fn rejects_missing_product() {
        let err = check_line(None, &line(99, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
        assert!(err.message.contains("99"));
    }

    #[test]
    fn rejects_inactive_product() {
        let err = check_line(Some(product(1, 100, Some(5), false)), &line(1, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInactive);
    }

    #[test]
    fn rejects_insufficient_stock() {
        let err = check_line(Some(product(1, 100, Some(2), true)), &line(1, 3)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let err = check_line(Some(product(1, 100, Some(5), true)), &line(1, 0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = check_line(Some(product(1, 100, None, true)), &line(1, -2)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn inactive_wins_over_stock_check() {
        // An inactive product reports inactive even when stock is also short
        let err = check_line(Some(product(1, 100, Some(0), false)), &line(1, 5)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInactive);
    }
}
