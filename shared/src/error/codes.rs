//! Unified error codes for the Shoal platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Store errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1002,
    /// Token is invalid
    TokenInvalid = 1003,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Store ====================
    /// Store not found (or caller lacks access; deliberately conflated)
    StoreNotFound = 3001,
    /// Store slug already taken
    SlugTaken = 3002,
    /// Store is not active
    StoreInactive = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order contains no items
    OrderEmpty = 4002,
    /// Order status value is not recognized
    OrderStatusInvalid = 4003,

    // ==================== 5xxx: Payment ====================
    /// Checkout session creation failed
    PaymentSetupFailed = 5001,
    /// Webhook signature missing or invalid
    WebhookSignatureInvalid = 5002,

    // ==================== 6xxx: Product ====================
    /// Product not found in this store
    ProductNotFound = 6001,
    /// Product is not available for purchase
    ProductInactive = 6002,
    /// Requested quantity exceeds tracked stock
    InsufficientStock = 6003,
    /// Stock adjustment would make stock negative
    NegativeStock = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::NotAuthenticated => "Authentication required",
            Self::TokenExpired => "Token expired",
            Self::TokenInvalid => "Invalid token",

            Self::PermissionDenied => "Permission denied",

            Self::StoreNotFound => "Store not found or access denied",
            Self::SlugTaken => "A store with this slug already exists",
            Self::StoreInactive => "Store is not active",

            Self::OrderNotFound => "Order not found or access denied",
            Self::OrderEmpty => "Order must contain at least one item",
            Self::OrderStatusInvalid => "Unrecognized order status",

            Self::PaymentSetupFailed => "Failed to create checkout session",
            Self::WebhookSignatureInvalid => "Webhook signature verification failed",

            Self::ProductNotFound => "Product not found",
            Self::ProductInactive => "Product is not available",
            Self::InsufficientStock => "Insufficient stock",
            Self::NegativeStock => "Stock quantity cannot be negative",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

/// Error returned when converting an unrecognized u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            1001 => Self::NotAuthenticated,
            1002 => Self::TokenExpired,
            1003 => Self::TokenInvalid,
            2001 => Self::PermissionDenied,
            3001 => Self::StoreNotFound,
            3002 => Self::SlugTaken,
            3003 => Self::StoreInactive,
            4001 => Self::OrderNotFound,
            4002 => Self::OrderEmpty,
            4003 => Self::OrderStatusInvalid,
            5001 => Self::PaymentSetupFailed,
            5002 => Self::WebhookSignatureInvalid,
            6001 => Self::ProductNotFound,
            6002 => Self::ProductInactive,
            6003 => Self::InsufficientStock,
            6004 => Self::NegativeStock,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            other => return Err(InvalidErrorCode(other)),
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::StoreNotFound,
            ErrorCode::InsufficientStock,
            ErrorCode::WebhookSignatureInvalid,
            ErrorCode::InternalError,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw), Ok(code));
        }
    }

    #[test]
    fn unknown_code_rejected() {
        assert_eq!(ErrorCode::try_from(7777), Err(InvalidErrorCode(7777)));
    }
}
