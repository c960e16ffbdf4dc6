use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::{
    auth::password::hash_password,
    errors::{internal, ApiError, StoreError},
    users::{
        dto::{CreateUserRequest, UpdateUserRequest},
        repo::{NewUser, ProfileUpdate, User},
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Canonical form for stored emails. Lookups fold the email column the same
/// way, so login accepts whatever casing the user registered with.
pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_registration(payload: &CreateUserRequest) -> Result<(), ApiError> {
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    // Bounds count characters, not bytes.
    let username_len = payload.username.chars().count();
    if username_len < 5 || username_len > 50 {
        warn!(username = %payload.username, "username length out of range");
        return Err(ApiError::BadRequest(
            "Username must be between 5 and 50 characters".into(),
        ));
    }
    let password_len = payload.password.chars().count();
    if password_len < 5 || password_len > 24 {
        warn!("password length out of range");
        return Err(ApiError::BadRequest(
            "Password must be between 5 and 24 characters".into(),
        ));
    }
    Ok(())
}

/// Register a new user. Uniqueness of username and email is enforced by the
/// store, not here; a duplicate surfaces as `Conflict`.
pub async fn create_user(db: &PgPool, mut payload: CreateUserRequest) -> Result<User, ApiError> {
    payload.email = normalize_email(&payload.email);
    payload.username = payload.username.trim().to_string();
    validate_registration(&payload)?;

    let hashed_password = hash_password(&payload.password).map_err(internal)?;

    let new = NewUser {
        username: payload.username,
        email: payload.email,
        hashed_password,
    };

    match User::create(db, &new).await {
        Ok(user) => {
            info!(user_id = %user.user_id, username = %user.username, "user registered");
            Ok(user)
        }
        Err(StoreError::Duplicate) => {
            warn!(username = %new.username, "duplicate username or email");
            Err(ApiError::Conflict(
                "User with this email or username already exists".into(),
            ))
        }
        Err(e) => Err(internal(e)),
    }
}

/// Apply a partial update to the authenticated user's own record. Only the
/// allow-listed profile fields can change through this path.
pub async fn update_user(
    db: &PgPool,
    current: &User,
    payload: UpdateUserRequest,
) -> Result<User, ApiError> {
    let update = ProfileUpdate {
        first_name: payload.first_name,
        last_name: payload.last_name,
        disabled: payload.disabled,
    };

    match User::update_profile(db, current.user_id, &update).await {
        Ok(user) => {
            info!(user_id = %user.user_id, "user updated");
            Ok(user)
        }
        Err(StoreError::NotFound) => {
            warn!(user_id = %current.user_id, "update target no longer exists");
            Err(ApiError::BadRequest("User does not exist".into()))
        }
        Err(e) => Err(internal(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: &str, username: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn accepts_a_well_formed_registration() {
        let p = payload("amy@example.com", "amy.pond", "s3cret");
        assert!(validate_registration(&p).is_ok());
    }

    #[test]
    fn rejects_invalid_email() {
        let p = payload("not-an-email", "amy.pond", "s3cret");
        assert!(matches!(
            validate_registration(&p),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_username_out_of_bounds() {
        let short = payload("amy@example.com", "amy", "s3cret");
        assert!(validate_registration(&short).is_err());

        let long = payload("amy@example.com", &"a".repeat(51), "s3cret");
        assert!(validate_registration(&long).is_err());
    }

    #[test]
    fn rejects_password_out_of_bounds() {
        let short = payload("amy@example.com", "amy.pond", "abcd");
        assert!(validate_registration(&short).is_err());

        let long = payload("amy@example.com", "amy.pond", &"p".repeat(25));
        assert!(validate_registration(&long).is_err());
    }

    #[test]
    fn bounds_count_characters_not_bytes() {
        // 50 two-byte characters is a valid username; 24 two-byte
        // characters is a valid password.
        let p = payload("amy@example.com", &"å".repeat(50), &"ü".repeat(24));
        assert!(validate_registration(&p).is_ok());

        let too_long = payload("amy@example.com", &"å".repeat(51), "s3cret");
        assert!(validate_registration(&too_long).is_err());
    }

    #[test]
    fn emails_normalize_to_registration_casing() {
        assert_eq!(normalize_email("Amy@Example.com"), "amy@example.com");
        assert_eq!(normalize_email("  amy@example.com  "), "amy@example.com");
        // Matches what the store's email arm folds identifiers to at login.
        assert_eq!(
            normalize_email("Amy@Example.com"),
            "Amy@Example.com".to_lowercase()
        );
    }

    #[test]
    fn email_regex_basics() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
    }
}
