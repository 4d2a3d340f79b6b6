//! Live-Postgres repository tests.
//!
//! These exercise the real adapter against the database named by
//! `DATABASE_URL`; they are ignored by default and run with
//! `cargo test -- --ignored` when a Postgres is available.

use super::{create_postgres_repository, init_database_with_retry_from_env};
use crate::domain::{NewUser, PasswordResetToken, Session, VerificationCode};
use chrono::Duration as ChronoDuration;
use once_cell::sync::Lazy;
use tokio::runtime::Runtime;
use uuid::Uuid;

// One runtime to rule them all...
/// Shared tokio runtime for all database tests.
///
/// We must initialize the database once and tests must share it.  Each test also must
/// share this single runtime instead of creating a new one per test.  This keeps the
/// database connection pool alive across all tests. Without it, each `#[tokio::test]`
/// would create its own runtime, and when that runtime drops at test completion, the pool
/// connections would be closed, causing subsequent tests to timeout waiting for new
/// connections.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    // ---
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create TOKIO runtime")
});

async fn setup_repo() -> crate::domain::RepositoryPtr {
    // ---
    init_database_with_retry_from_env()
        .await
        .expect("database init failed");

    create_postgres_repository().expect("repository creation failed")
}

fn unique_email() -> String {
    // ---
    format!("user-{}@example.com", Uuid::new_v4())
}

fn new_user(email: &str) -> NewUser {
    // ---
    NewUser {
        email: email.to_string(),
        password_hash: "argon2-hash".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    }
}

#[test]
#[ignore]
fn test_create_and_get_user() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = setup_repo().await;
        let email = unique_email();

        let created = repo.create_user(new_user(&email)).await.unwrap();
        assert!(!created.email_confirmed);

        let fetched = repo.get_user_by_email(&email).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.role, "member");

        let by_id = repo.get_user_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, email);
    });
}

#[test]
#[ignore]
fn test_verification_code_lifecycle() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = setup_repo().await;
        let user = repo.create_user(new_user(&unique_email())).await.unwrap();

        repo.create_verification_code(VerificationCode::new(user.id, "111111".to_string()))
            .await
            .unwrap();
        let invalidated = repo.invalidate_verification_codes(user.id).await.unwrap();
        assert_eq!(invalidated, 1);

        repo.create_verification_code(VerificationCode::new(user.id, "222222".to_string()))
            .await
            .unwrap();

        // Old code no longer findable, new one is the latest unused
        assert!(repo
            .find_verification_code(user.id, "111111")
            .await
            .unwrap()
            .is_none());
        let latest = repo
            .latest_unused_verification_code(user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.code, "222222");

        repo.confirm_email(user.id).await.unwrap();
        let confirmed = repo.get_user_by_id(user.id).await.unwrap().unwrap();
        assert!(confirmed.email_confirmed);
        assert!(repo
            .latest_unused_verification_code(user.id)
            .await
            .unwrap()
            .is_none());
    });
}

#[test]
#[ignore]
fn test_reset_token_lifecycle() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = setup_repo().await;
        let user = repo.create_user(new_user(&unique_email())).await.unwrap();

        let token = PasswordResetToken::new(
            user.id,
            format!("digest-{}", Uuid::new_v4()),
            ChronoDuration::minutes(10),
        );
        let hash = token.token_hash.clone();
        repo.create_reset_token(token.clone()).await.unwrap();

        let found = repo.find_reset_token(&hash).await.unwrap().unwrap();
        assert_eq!(found.id, token.id);

        repo.mark_reset_token_used(token.id).await.unwrap();
        assert!(repo.find_reset_token(&hash).await.unwrap().is_none());

        repo.set_password(user.id, "new-argon2-hash").await.unwrap();
        let updated = repo.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.password_hash, "new-argon2-hash");
    });
}

#[test]
#[ignore]
fn test_create_session_row() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = setup_repo().await;
        let user = repo.create_user(new_user(&unique_email())).await.unwrap();

        let session = Session::new(
            user.id,
            format!("digest-{}", Uuid::new_v4()),
            ChronoDuration::days(7),
        );
        repo.create_session(session).await.unwrap();
    });
}
