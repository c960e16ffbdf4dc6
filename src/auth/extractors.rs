use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::jwt::{JwtKeys, TokenKind},
    errors::{internal, ApiError},
    state::AppState,
    users::repo::User,
};

/// Authenticates the request and resolves the full user record, so handlers
/// receive the current user as an explicit parameter.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err(ApiError::Unauthorized("Invalid or expired token".into()));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err(ApiError::Unauthorized("Access token required".into()));
        }

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(internal)?
            .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

        if user.disabled {
            warn!(user_id = %user.user_id, "disabled user presented a valid token");
            return Err(ApiError::Unauthorized("User is disabled".into()));
        }

        Ok(CurrentUser(user))
    }
}
