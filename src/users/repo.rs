use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::StoreError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String, // argon2 hash, not exposed in JSON
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub disabled: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

/// Fields a partial update may touch. `user_id`, `username` and `email` are
/// not reachable through this path.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub disabled: Option<bool>,
}

impl User {
    /// Insert a new user. The store assigns `user_id` and enforces the
    /// uniqueness of `username` and `email`.
    pub async fn create(db: &PgPool, new: &NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, hashed_password)
            VALUES ($1, $2, $3)
            RETURNING user_id, username, email, hashed_password,
                      first_name, last_name, disabled, created_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.hashed_password)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Look up a user by login identifier, matching either column. Usernames
    /// match exactly; emails are stored lowercased, so the email arm folds
    /// the identifier to match however the caller cased it.
    pub async fn find_by_username_or_email(
        db: &PgPool,
        identifier: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, hashed_password,
                   first_name, last_name, disabled, created_at
            FROM users
            WHERE username = $1 OR email = lower($1)
            "#,
        )
        .bind(identifier)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, hashed_password,
                   first_name, last_name, disabled, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Apply allow-listed fields to an existing record. Absent fields keep
    /// their stored value.
    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                disabled   = COALESCE($4, disabled)
            WHERE user_id = $1
            RETURNING user_id, username, email, hashed_password,
                      first_name, last_name, disabled, created_at
            "#,
        )
        .bind(user_id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(update.disabled)
        .fetch_optional(db)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(user)
    }
}
