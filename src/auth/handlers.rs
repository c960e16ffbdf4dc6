use axum::{
    extract::{FromRef, State},
    routing::post,
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, RefreshRequest, TokenPair},
        jwt::JwtKeys,
        service::authenticate,
    },
    errors::{internal, ApiError},
    state::AppState,
    users::repo::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenPair>, ApiError> {
    let identifier = form.username.trim();

    let user = authenticate(&state.db, identifier, &form.password)
        .await?
        .ok_or(ApiError::AuthenticationFailed)?;

    let keys = JwtKeys::from_ref(&state);
    let pair = keys.issue_pair(user.user_id).map_err(internal)?;

    info!(user_id = %user.user_id, username = %user.username, "user logged in");
    Ok(Json(pair))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|_| {
        warn!("invalid or expired refresh token");
        ApiError::Unauthorized("Invalid or expired refresh token".into())
    })?;

    // The token is stateless, so re-check that the subject still exists.
    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    if user.disabled {
        return Err(ApiError::Unauthorized("User is disabled".into()));
    }

    let pair = keys.issue_pair(user.user_id).map_err(internal)?;
    info!(user_id = %user.user_id, "token pair refreshed");
    Ok(Json(pair))
}
