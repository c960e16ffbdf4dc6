use sqlx::PgPool;
use tracing::warn;

use crate::{
    auth::password::verify_password,
    errors::{internal, ApiError},
    users::repo::User,
};

/// Verify submitted credentials against the store. Returns `None` for both
/// an unknown identifier and a wrong password, so callers cannot tell the
/// two apart (prevents user enumeration).
pub async fn authenticate(
    db: &PgPool,
    identifier: &str,
    password: &str,
) -> Result<Option<User>, ApiError> {
    let user = match User::find_by_username_or_email(db, identifier)
        .await
        .map_err(internal)?
    {
        Some(user) => user,
        None => {
            warn!(identifier = %identifier, "login with unknown identifier");
            return Ok(None);
        }
    };

    let ok = verify_password(password, &user.hashed_password).map_err(internal)?;
    if !ok {
        warn!(user_id = %user.user_id, "login with invalid password");
        return Ok(None);
    }

    Ok(Some(user))
}
