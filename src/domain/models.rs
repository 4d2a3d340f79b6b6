use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Represents a registered account.
#[derive(Debug, Clone)]
pub struct User {
    // ---
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_staff: bool,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

/// Field set required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    // ---
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    // ---
    pub fn new(new_user: NewUser) -> Self {
        // ---
        Self {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            role: "member".to_string(),
            is_staff: false,
            email_confirmed: false,
            created_at: Utc::now(),
        }
    }
}

/// A 6-digit email verification code.
///
/// At most one unused, unexpired code is honored per user at any time;
/// issuing a new code invalidates all earlier unused ones.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    // ---
    pub id: Uuid,

    /// Owner of the code.
    pub user_id: Uuid,

    /// Stored in cleartext; short-lived, single-use, and rate-limited.
    pub code: String,

    pub created_at: DateTime<Utc>,
    pub used: bool,
}

impl VerificationCode {
    // ---
    pub fn new(user_id: Uuid, code: String) -> Self {
        // ---
        Self {
            id: Uuid::new_v4(),
            user_id,
            code,
            created_at: Utc::now(),
            used: false,
        }
    }
}

/// A password-reset token record.
///
/// Only the SHA-256 digest of the raw token is persisted; the raw value
/// exists only inside the one-time link mailed to the user.
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    // ---
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl PasswordResetToken {
    // ---
    pub fn new(user_id: Uuid, token_hash: String, ttl: Duration) -> Self {
        // ---
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            created_at: now,
            expires_at: now + ttl,
            used: false,
        }
    }

    /// Active means not consumed and not past its expiry.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        // ---
        !self.used && self.expires_at > now
    }
}

/// A server-side session row. Holds only the token digest.
#[derive(Debug, Clone)]
pub struct Session {
    // ---
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    // ---
    pub fn new(user_id: Uuid, token_hash: String, ttl: Duration) -> Self {
        // ---
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            created_at: now,
            expires_at: now + ttl,
        }
    }
}
