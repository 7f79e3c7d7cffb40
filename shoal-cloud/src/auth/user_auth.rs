//! User JWT authentication for the storefront API
//!
//! Staff and customers share one token format; authorization (store
//! membership, roles) is decided per-query against `store_members`.

use axum::http::HeaderMap;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// JWT claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    /// User ID
    pub sub: String,
    /// User email
    pub email: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated user identity extracted from JWT
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
}

/// Verify a bearer token and extract the identity
pub fn verify_token(token: &str, secret: &str) -> Result<UserIdentity, AppError> {
    let token_data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired),
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    Ok(UserIdentity {
        user_id: token_data.claims.sub,
        email: token_data.claims.email,
    })
}

/// Best-effort identity from request headers (for endpoints that work both
/// anonymously and authenticated, e.g. analytics tracking)
pub fn try_identity(headers: &HeaderMap, secret: &str) -> Option<UserIdentity> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?;
    verify_token(token, secret).ok()
}

/// Middleware that extracts and verifies the user JWT from the Authorization header
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;

    let identity = verify_token(token, &state.jwt_secret)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    // Tokens are minted by the identity provider in front of this service;
    // this helper only exists to exercise verification.
    fn create_token(user_id: &str, email: &str, secret: &str) -> String {
        let now = chrono::Utc::now();
        let claims = UserClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + chrono::Duration::hours(24)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn round_trips_identity() {
        let token = create_token("user_1", "a@example.com", "test-secret");
        let identity = verify_token(&token, "test-secret").unwrap();
        assert_eq!(identity.user_id, "user_1");
        assert_eq!(identity.email, "a@example.com");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = create_token("user_1", "a@example.com", "test-secret");
        let err = verify_token(&token, "other-secret").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn rejects_expired_token() {
        let now = chrono::Utc::now();
        let claims = UserClaims {
            sub: "user_1".into(),
            email: "a@example.com".into(),
            exp: (now - chrono::Duration::hours(2)).timestamp() as usize,
            iat: (now - chrono::Duration::hours(3)).timestamp() as usize,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = verify_token(&token, "test-secret").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn try_identity_requires_bearer_scheme() {
        let token = create_token("user_1", "a@example.com", "test-secret");

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", format!("Bearer {token}").parse().unwrap());
        assert!(try_identity(&headers, "test-secret").is_some());

        let mut bare = HeaderMap::new();
        bare.insert("Authorization", token.parse().unwrap());
        assert!(try_identity(&bare, "test-secret").is_none());

        assert!(try_identity(&HeaderMap::new(), "test-secret").is_none());
    }
}
