//! Email verification-code lifecycle.
//!
//! Issuing a code invalidates every earlier unused code for the user, so
//! at most one code is honored at any time. Consumption enforces both the
//! 24-hour age limit and the newest-unused-wins rule before confirming
//! the email.

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};

use crate::config::{EmailConfig, ServerConfig};
use crate::domain::{
    EmailMessage, MailerPtr, MetricsPtr, RepositoryPtr, User, VerificationCode,
};
use crate::security::generate_verification_code;

/// Codes older than this are rejected even when still unused.
const CODE_MAX_AGE_HOURS: i64 = 24;

// ---

/// Issue a fresh verification code and enqueue the email carrying it.
///
/// All prior unused codes for the user are invalidated first, so the
/// returned code is the only one `verify_code` will accept.
pub async fn issue_verification_code(
    repository: &RepositoryPtr,
    mailer: &MailerPtr,
    metrics: &MetricsPtr,
    server: &ServerConfig,
    email: &EmailConfig,
    user: &User,
) -> Result<String> {
    // ---
    repository.invalidate_verification_codes(user.id).await?;

    let code = generate_verification_code();
    repository
        .create_verification_code(VerificationCode::new(user.id, code.clone()))
        .await?;

    let verify_url = format!("{}/auth/verify", server.site_url);
    let message = EmailMessage {
        from: email.from_address.clone(),
        to: user.email.clone(),
        subject: "Verify your email address".to_string(),
        text_body: format!(
            "Hi {},\n\nYour verification code is {code}. It expires in {CODE_MAX_AGE_HOURS} \
             hours.\n\nEnter it at {verify_url} to activate your account.\n",
            user.first_name
        ),
        html_body: format!(
            "<p>Hi {},</p><p>Your verification code is <strong>{code}</strong>. \
             It expires in {CODE_MAX_AGE_HOURS} hours.</p>\
             <p>Enter it at <a href=\"{verify_url}\">{verify_url}</a> to activate \
             your account.</p>",
            user.first_name
        ),
    };

    mailer.send(message).await?;
    metrics.record_email_enqueued("verification");
    tracing::info!(email = %user.email, "verification code issued");

    Ok(code)
}

/// Consume a verification code for the user.
///
/// Returns false (never an error) for every user-input problem: no such
/// unused code, code older than 24 hours, or a code that is not the
/// newest unused one (a replay of a superseded code). On success all
/// unused codes are consumed and the email is confirmed in one
/// transaction.
pub async fn verify_code(repository: &RepositoryPtr, user: &User, code: &str) -> Result<bool> {
    // ---
    let Some(record) = repository.find_verification_code(user.id, code).await? else {
        return Ok(false);
    };

    let now = Utc::now();
    if now - record.created_at > ChronoDuration::hours(CODE_MAX_AGE_HOURS) {
        return Ok(false);
    }

    // Newest-unused-wins: a superseded code must not confirm the account
    // even if its own invalidation was missed.
    match repository.latest_unused_verification_code(user.id).await? {
        Some(latest) if latest.id == record.id => {}
        _ => return Ok(false),
    }

    repository.confirm_email(user.id).await?;
    tracing::info!(email = %user.email, "email confirmed");
    Ok(true)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::test_support::{test_email_config, test_server_config, InMemoryRepository, RecordingMailer};
    use crate::infrastructure::create_noop_metrics;
    use std::sync::Arc;

    async fn setup() -> (Arc<InMemoryRepository>, RepositoryPtr, Arc<RecordingMailer>, MailerPtr, MetricsPtr, User)
    {
        // ---
        let repo = Arc::new(InMemoryRepository::new());
        let repository: RepositoryPtr = repo.clone();
        let mailer = Arc::new(RecordingMailer::new());
        let mailer_ptr: MailerPtr = mailer.clone();
        let metrics = create_noop_metrics().unwrap();

        let user = repository
            .create_user(crate::domain::NewUser {
                email: "ada@example.com".to_string(),
                password_hash: "hash".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            })
            .await
            .unwrap();

        (repo, repository, mailer, mailer_ptr, metrics, user)
    }

    #[tokio::test]
    async fn issued_code_verifies_once() {
        // ---
        let (_repo, repository, mailer, mailer_ptr, metrics, user) = setup().await;

        let code = issue_verification_code(
            &repository,
            &mailer_ptr,
            &metrics,
            &test_server_config(),
            &test_email_config(),
            &user,
        )
        .await
        .unwrap();

        // Email carried the code
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text_body.contains(&code));

        assert!(verify_code(&repository, &user, &code).await.unwrap());
        let confirmed = repository.get_user_by_id(user.id).await.unwrap().unwrap();
        assert!(confirmed.email_confirmed);

        // Replay fails
        assert!(!verify_code(&repository, &user, &code).await.unwrap());
    }

    #[tokio::test]
    async fn new_code_invalidates_old_one() {
        // ---
        let (_repo, repository, _mailer, mailer_ptr, metrics, user) = setup().await;
        let server = test_server_config();
        let email = test_email_config();

        let first =
            issue_verification_code(&repository, &mailer_ptr, &metrics, &server, &email, &user)
                .await
                .unwrap();
        let second =
            issue_verification_code(&repository, &mailer_ptr, &metrics, &server, &email, &user)
                .await
                .unwrap();

        assert!(!verify_code(&repository, &user, &first).await.unwrap());
        assert!(verify_code(&repository, &user, &second).await.unwrap());
        assert!(!verify_code(&repository, &user, &second).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_code_rejected() {
        // ---
        let (_repo, repository, _mailer, mailer_ptr, metrics, user) = setup().await;

        issue_verification_code(
            &repository,
            &mailer_ptr,
            &metrics,
            &test_server_config(),
            &test_email_config(),
            &user,
        )
        .await
        .unwrap();

        assert!(!verify_code(&repository, &user, "000000").await.unwrap());
    }

    #[tokio::test]
    async fn stale_code_rejected() {
        // ---
        let (repo, repository, _mailer, mailer_ptr, metrics, user) = setup().await;

        let code = issue_verification_code(
            &repository,
            &mailer_ptr,
            &metrics,
            &test_server_config(),
            &test_email_config(),
            &user,
        )
        .await
        .unwrap();

        repo.age_verification_codes(user.id, ChronoDuration::hours(25));

        assert!(!verify_code(&repository, &user, &code).await.unwrap());
    }
}
