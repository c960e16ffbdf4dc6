use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    errors::ApiError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest, UserOut},
        service,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(create_user))
        .route("/user/me", get(get_me))
        .route("/user/update", post(update_user))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<UserOut>, ApiError> {
    let user = service::create_user(&state.db, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserOut> {
    Json(user.into())
}

#[instrument(skip(state, user, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserOut>, ApiError> {
    let updated = service::update_user(&state.db, &user, payload).await?;
    Ok(Json(updated.into()))
}
