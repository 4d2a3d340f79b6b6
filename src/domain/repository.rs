use super::models::{NewUser, PasswordResetToken, Session, User, VerificationCode};
use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Abstraction for account, code, token, and session persistence.
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    // ---
    /// Create a new unconfirmed account.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Get user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by ID.
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Replace the stored password hash for a user.
    async fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<()>;

    /// Insert a fresh verification code row.
    async fn create_verification_code(&self, code: VerificationCode) -> Result<()>;

    /// Mark every unused verification code for the user as used.
    /// Returns the number of rows touched.
    async fn invalidate_verification_codes(&self, user_id: Uuid) -> Result<u64>;

    /// Newest unused code row matching the exact code value.
    async fn find_verification_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<Option<VerificationCode>>;

    /// Newest unused code row for the user, regardless of value.
    async fn latest_unused_verification_code(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VerificationCode>>;

    /// Consume the user's verification codes and flip the confirmed flag.
    /// Both writes happen in one transaction.
    async fn confirm_email(&self, user_id: Uuid) -> Result<()>;

    /// Insert a fresh password-reset token row.
    async fn create_reset_token(&self, token: PasswordResetToken) -> Result<()>;

    /// Mark every unused reset token for the user as used.
    /// Returns the number of rows touched.
    async fn invalidate_reset_tokens(&self, user_id: Uuid) -> Result<u64>;

    /// Newest unused reset token row with the given digest.
    async fn find_reset_token(&self, token_hash: &str) -> Result<Option<PasswordResetToken>>;

    /// Mark a single reset token as consumed.
    async fn mark_reset_token_used(&self, token_id: Uuid) -> Result<()>;

    /// Insert a session row.
    async fn create_session(&self, session: Session) -> Result<()>;
}

/// Type alias for any backend that implements Repository.
pub type RepositoryPtr = Arc<dyn Repository>;
