//! Database access layer
//!
//! Plain sqlx queries grouped per aggregate. Every query that reads or writes
//! store-scoped data binds the store_id so tenants stay isolated.

pub mod analytics;
pub mod orders;
pub mod products;
pub mod stores;
pub mod subscriptions;
