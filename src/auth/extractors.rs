use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    auth::jwt::{Claims, JwtKeys, TokenError},
    error::ApiError,
};

/// Session gate: pulls the bearer token off the request, verifies it,
/// and hands the claims to the handler. Stateless by design: it never
/// touches the credential store, so a logged-out token stays valid
/// until it expires.
///
/// Status policy: 401 when the token is missing, not a Bearer header,
/// or expired; 403 when a token was presented but fails verification.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("Access token required"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized("Access token required"))?;

        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(TokenError::Expired) => Err(ApiError::Unauthorized("Invalid or expired token")),
            Err(TokenError::Invalid) => Err(ApiError::Forbidden("Invalid or expired token")),
        }
    }
}
