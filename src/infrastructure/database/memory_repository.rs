//! In-memory [`Repository`] backed by plain vectors.
//!
//! Selected with `AUTHGUARD_REPOSITORY_BACKEND=memory`; lets the server
//! run without Postgres for local experiments and integration tests.
//! State lives only as long as the process.

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::{
    NewUser, PasswordResetToken, Repository, RepositoryPtr, Session, User, VerificationCode,
};

pub fn create_memory_repository() -> RepositoryPtr {
    Arc::new(MemoryRepository::new())
}

#[derive(Default)]
pub struct MemoryRepository {
    // ---
    users: Mutex<Vec<User>>,
    codes: Mutex<Vec<VerificationCode>>,
    tokens: Mutex<Vec<PasswordResetToken>>,
    sessions: Mutex<Vec<Session>>,
}

impl MemoryRepository {
    // ---
    pub fn new() -> Self {
        Self::default()
    }
}

// Inspection and clock-manipulation helpers for the unit suites.
#[cfg(test)]
impl MemoryRepository {
    // ---
    /// Sessions stored for a user.
    pub fn sessions_for(&self, user_id: Uuid) -> Vec<Session> {
        // ---
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Reset-token rows stored for a user.
    pub fn reset_tokens_for(&self, user_id: Uuid) -> Vec<PasswordResetToken> {
        // ---
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Backdate a user's verification codes, as if `age` had passed.
    pub fn age_verification_codes(&self, user_id: Uuid, age: chrono::Duration) {
        // ---
        for code in self.codes.lock().unwrap().iter_mut() {
            if code.user_id == user_id {
                code.created_at -= age;
            }
        }
    }

    /// Backdate a user's reset tokens, as if `age` had passed.
    pub fn age_reset_tokens(&self, user_id: Uuid, age: chrono::Duration) {
        // ---
        for token in self.tokens.lock().unwrap().iter_mut() {
            if token.user_id == user_id {
                token.created_at -= age;
                token.expires_at -= age;
            }
        }
    }

    /// Flag a user as staff.
    pub fn make_staff(&self, user_id: Uuid) {
        // ---
        for user in self.users.lock().unwrap().iter_mut() {
            if user.id == user_id {
                user.is_staff = true;
                user.role = "staff".to_string();
            }
        }
    }
}

#[async_trait::async_trait]
impl Repository for MemoryRepository {
    // ---
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        // ---
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(anyhow!("duplicate email"));
        }
        let user = User::new(new_user);
        users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        // ---
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        // ---
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        // ---
        for user in self.users.lock().unwrap().iter_mut() {
            if user.id == user_id {
                user.password_hash = password_hash.to_string();
            }
        }
        Ok(())
    }

    async fn create_verification_code(&self, code: VerificationCode) -> Result<()> {
        // ---
        self.codes.lock().unwrap().push(code);
        Ok(())
    }

    async fn invalidate_verification_codes(&self, user_id: Uuid) -> Result<u64> {
        // ---
        let mut touched = 0;
        for code in self.codes.lock().unwrap().iter_mut() {
            if code.user_id == user_id && !code.used {
                code.used = true;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn find_verification_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<Option<VerificationCode>> {
        // ---
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id && c.code == code && !c.used)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn latest_unused_verification_code(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VerificationCode>> {
        // ---
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id && !c.used)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn confirm_email(&self, user_id: Uuid) -> Result<()> {
        // ---
        for code in self.codes.lock().unwrap().iter_mut() {
            if code.user_id == user_id {
                code.used = true;
            }
        }
        for user in self.users.lock().unwrap().iter_mut() {
            if user.id == user_id {
                user.email_confirmed = true;
            }
        }
        Ok(())
    }

    async fn create_reset_token(&self, token: PasswordResetToken) -> Result<()> {
        // ---
        self.tokens.lock().unwrap().push(token);
        Ok(())
    }

    async fn invalidate_reset_tokens(&self, user_id: Uuid) -> Result<u64> {
        // ---
        let mut touched = 0;
        for token in self.tokens.lock().unwrap().iter_mut() {
            if token.user_id == user_id && !token.used {
                token.used = true;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn find_reset_token(&self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        // ---
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.token_hash == token_hash && !t.used)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn mark_reset_token_used(&self, token_id: Uuid) -> Result<()> {
        // ---
        for token in self.tokens.lock().unwrap().iter_mut() {
            if token.id == token_id {
                token.used = true;
            }
        }
        Ok(())
    }

    async fn create_session(&self, session: Session) -> Result<()> {
        // ---
        self.sessions.lock().unwrap().push(session);
        Ok(())
    }
}
