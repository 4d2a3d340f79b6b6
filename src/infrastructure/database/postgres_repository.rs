use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{NewUser, PasswordResetToken, Repository, Session, User, VerificationCode};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    is_staff: bool,
    email_confirmed: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    // ---
    fn from(r: UserRow) -> Self {
        // ---
        User {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            first_name: r.first_name,
            last_name: r.last_name,
            role: r.role,
            is_staff: r.is_staff,
            email_confirmed: r.email_confirmed,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VerificationCodeRow {
    id: Uuid,
    user_id: Uuid,
    code: String,
    created_at: DateTime<Utc>,
    used: bool,
}

impl From<VerificationCodeRow> for VerificationCode {
    // ---
    fn from(r: VerificationCodeRow) -> Self {
        // ---
        VerificationCode {
            id: r.id,
            user_id: r.user_id,
            code: r.code,
            created_at: r.created_at,
            used: r.used,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ResetTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used: bool,
}

impl From<ResetTokenRow> for PasswordResetToken {
    // ---
    fn from(r: ResetTokenRow) -> Self {
        // ---
        PasswordResetToken {
            id: r.id,
            user_id: r.user_id,
            token_hash: r.token_hash,
            created_at: r.created_at,
            expires_at: r.expires_at,
            used: r.used,
        }
    }
}

pub struct PostgresRepository {
    // ---
    pool: PgPool,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Repository for PostgresRepository {
    // ---
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        // ---
        let user = User::new(new_user);

        sqlx::query(
            "INSERT INTO users
                (id, email, password_hash, first_name, last_name, role,
                 is_staff, email_confirmed, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.role)
        .bind(user.is_staff)
        .bind(user.email_confirmed)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, first_name, last_name, role,
                    is_staff, email_confirmed, created_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, first_name, last_name, role,
                    is_staff, email_confirmed, created_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        // ---
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_verification_code(&self, code: VerificationCode) -> Result<()> {
        // ---
        sqlx::query(
            "INSERT INTO verification_codes (id, user_id, code, created_at, used)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(code.id)
        .bind(code.user_id)
        .bind(&code.code)
        .bind(code.created_at)
        .bind(code.used)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn invalidate_verification_codes(&self, user_id: Uuid) -> Result<u64> {
        // ---
        let result = sqlx::query(
            "UPDATE verification_codes SET used = TRUE WHERE user_id = $1 AND used = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_verification_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<Option<VerificationCode>> {
        // ---
        let row = sqlx::query_as::<_, VerificationCodeRow>(
            "SELECT id, user_id, code, created_at, used
             FROM verification_codes
             WHERE user_id = $1 AND code = $2 AND used = FALSE
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VerificationCode::from))
    }

    async fn latest_unused_verification_code(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VerificationCode>> {
        // ---
        let row = sqlx::query_as::<_, VerificationCodeRow>(
            "SELECT id, user_id, code, created_at, used
             FROM verification_codes
             WHERE user_id = $1 AND used = FALSE
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VerificationCode::from))
    }

    async fn confirm_email(&self, user_id: Uuid) -> Result<()> {
        // ---
        // Consuming the codes and flipping the flag is one logical step.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE verification_codes SET used = TRUE WHERE user_id = $1 AND used = FALSE",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET email_confirmed = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_reset_token(&self, token: PasswordResetToken) -> Result<()> {
        // ---
        sqlx::query(
            "INSERT INTO password_reset_tokens
                (id, user_id, token_hash, created_at, expires_at, used)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.used)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn invalidate_reset_tokens(&self, user_id: Uuid) -> Result<u64> {
        // ---
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used = TRUE WHERE user_id = $1 AND used = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_reset_token(&self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        // ---
        let row = sqlx::query_as::<_, ResetTokenRow>(
            "SELECT id, user_id, token_hash, created_at, expires_at, used
             FROM password_reset_tokens
             WHERE token_hash = $1 AND used = FALSE
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PasswordResetToken::from))
    }

    async fn mark_reset_token_used(&self, token_id: Uuid) -> Result<()> {
        // ---
        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_session(&self, session: Session) -> Result<()> {
        // ---
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
