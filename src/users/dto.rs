use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::User;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Request body for a partial profile update. Absent fields are untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub disabled: Option<bool>,
}

/// Client-facing view of a user. The password hash stays server-side.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub disabled: bool,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            disabled: user.disabled,
        }
    }
}
