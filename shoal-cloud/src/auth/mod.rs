//! Authentication for the storefront API

pub mod user_auth;

pub use user_auth::{UserIdentity, user_auth_middleware};
