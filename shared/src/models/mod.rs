//! Data models
//!
//! Shared between shoal-cloud and API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All row IDs are `i64` (Postgres BIGSERIAL); user/customer IDs are the
//! identity provider's opaque strings. Timestamps are epoch milliseconds.

pub mod analytics;
pub mod order;
pub mod product;
pub mod store;
pub mod subscription;

pub use analytics::*;
pub use order::*;
pub use product::*;
pub use store::*;
pub use subscription::*;
