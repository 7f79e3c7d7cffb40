//! Shared types for the Shoal storefront platform
//!
//! Used by shoal-cloud (and any future worker crates) for:
//! - [`error`]: unified error codes, `AppError`, HTTP mapping
//! - [`events`]: typed domain-event payloads published on the fan-out bus
//! - [`models`]: store/catalog/order/subscription row and DTO types
//! - [`util`]: timestamp helpers

pub mod error;
pub mod events;
pub mod models;
pub mod util;
