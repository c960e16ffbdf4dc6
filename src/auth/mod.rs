use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod service;
pub(crate) mod extractors;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
