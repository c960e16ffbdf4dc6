use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures surfaced by the credential store. Callers match on these
/// explicitly; nothing is retried or recovered silently.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate username or email")]
    Duplicate,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Database(err),
        }
    }
}

/// Client-visible error taxonomy. Every store-level failure maps to exactly
/// one of these at the handler boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    /// Deliberately the same message for "no such user" and "wrong password".
    #[error("Incorrect username or password")]
    AuthenticationFailed,
    #[error("Internal server error")]
    Internal(String),
}

/// Logs the underlying error and returns an opaque `Internal`; the detail
/// never reaches the client.
pub fn internal(err: impl std::fmt::Display) -> ApiError {
    error!(error = %err, "internal error");
    ApiError::Internal(err.to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Conflict(_) | ApiError::BadRequest(_) | ApiError::AuthenticationFailed => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let detail = match &self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let cases = [
            (ApiError::Conflict("taken".into()), StatusCode::BAD_REQUEST),
            (ApiError::BadRequest("nope".into()), StatusCode::BAD_REQUEST),
            (ApiError::AuthenticationFailed, StatusCode::BAD_REQUEST),
            (
                ApiError::Unauthorized("no token".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn failed_login_response_is_the_same_for_both_causes() {
        // Unknown identifier and wrong password both surface as this one
        // unit variant, so status and body cannot drift apart.
        let response = ApiError::AuthenticationFailed.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            json!({ "detail": "Incorrect username or password" })
        );
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let response = ApiError::Internal("connection refused to 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
