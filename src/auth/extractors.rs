use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::cookie::token_from_cookie_header;
use crate::auth::jwt::{Claims, SessionKeys};
use crate::error::ApiError;
use crate::users::repo::Role;

/// Recovers the session claims from the session cookie. Rejects with 401
/// when the cookie is absent, tampered with, or expired.
pub struct SessionUser(pub Claims);

/// Same as [`SessionUser`] but additionally requires the admin role.
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let cookie_header = parts
            .headers
            .get(axum::http::header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".into()))?;

        let token = token_from_cookie_header(cookie_header)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".into()))?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired session token");
            ApiError::Unauthorized("Unauthorized".into())
        })?;

        Ok(SessionUser(claims))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionUser(claims) = SessionUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            warn!(user_id = %claims.sub, "non-admin hit an admin endpoint");
            return Err(ApiError::Unauthorized("Unauthorized".into()));
        }
        Ok(AdminUser(claims))
    }
}
