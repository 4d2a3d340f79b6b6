use crate::domain::User;
use serde::Serialize;

/// Error body shared by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    // ---
    pub fn new(message: impl Into<String>) -> Self {
        // ---
        Self {
            error: message.into(),
        }
    }
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub email_confirmed: bool,
}

impl From<&User> for UserResponse {
    // ---
    fn from(user: &User) -> Self {
        // ---
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role.clone(),
            email_confirmed: user.email_confirmed,
        }
    }
}
