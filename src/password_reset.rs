//! Password-reset-token lifecycle.
//!
//! Only the SHA-256 digest of a token is ever persisted; the raw value
//! exists once, inside the emailed link. Issuing a token invalidates all
//! prior unused tokens for the user, and lookup treats used or expired
//! rows exactly like absent ones.

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};

use crate::config::{EmailConfig, ServerConfig};
use crate::domain::{EmailMessage, MailerPtr, MetricsPtr, PasswordResetToken, RepositoryPtr, User};
use crate::security::{generate_reset_token, hash_token};

// ---

/// Issue a fresh reset token and enqueue the email carrying its link.
///
/// Returns the raw token; it is not retrievable afterwards.
pub async fn issue_reset_token(
    repository: &RepositoryPtr,
    mailer: &MailerPtr,
    metrics: &MetricsPtr,
    server: &ServerConfig,
    email: &EmailConfig,
    user: &User,
) -> Result<String> {
    // ---
    repository.invalidate_reset_tokens(user.id).await?;

    let token = generate_reset_token();
    let ttl_minutes = email.reset_token_ttl.as_secs() / 60;
    repository
        .create_reset_token(PasswordResetToken::new(
            user.id,
            hash_token(&token),
            ChronoDuration::seconds(email.reset_token_ttl.as_secs() as i64),
        ))
        .await?;

    let reset_url = format!(
        "{}/password-reset/confirm?token={token}",
        server.site_url
    );
    let message = EmailMessage {
        from: email.from_address.clone(),
        to: user.email.clone(),
        subject: "Reset your password".to_string(),
        text_body: format!(
            "Hi {},\n\nUse this link to choose a new password (valid for \
             {ttl_minutes} minutes):\n\n{reset_url}\n\nIf you did not request \
             this, you can ignore this email.\n",
            user.first_name
        ),
        html_body: format!(
            "<p>Hi {},</p><p>Use <a href=\"{reset_url}\">this link</a> to choose \
             a new password (valid for {ttl_minutes} minutes).</p>\
             <p>If you did not request this, you can ignore this email.</p>",
            user.first_name
        ),
    };

    mailer.send(message).await?;
    metrics.record_email_enqueued("password_reset");
    tracing::info!(email = %user.email, "password reset token issued");

    Ok(token)
}

/// Look up the active token record for a presented raw token.
///
/// Absent, already used, and expired rows are indistinguishable to the
/// caller: all come back as `None`.
pub async fn find_active_reset_token(
    repository: &RepositoryPtr,
    raw_token: &str,
) -> Result<Option<PasswordResetToken>> {
    // ---
    let Some(record) = repository.find_reset_token(&hash_token(raw_token)).await? else {
        return Ok(None);
    };
    if !record.is_active(Utc::now()) {
        return Ok(None);
    }
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::infrastructure::create_noop_metrics;
    use crate::test_support::{
        test_email_config, test_server_config, InMemoryRepository, RecordingMailer,
    };
    use std::sync::Arc;

    async fn setup() -> (
        Arc<InMemoryRepository>,
        RepositoryPtr,
        Arc<RecordingMailer>,
        MailerPtr,
        MetricsPtr,
        User,
    ) {
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
    async fn issued_token_is_emailed_and_active() {
        // ---
        let (repo, repository, mailer, mailer_ptr, metrics, user) = setup().await;

        let token = issue_reset_token(
            &repository,
            &mailer_ptr,
            &metrics,
            &test_server_config(),
            &test_email_config(),
            &user,
        )
        .await
        .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text_body.contains(&token));

        // Only the digest hit storage
        assert!(repo.reset_tokens_for(user.id).iter().all(|t| t.token_hash != token));

        let record = find_active_reset_token(&repository, &token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.user_id, user.id);
    }

    #[tokio::test]
    async fn new_token_invalidates_old_one() {
        // ---
        let (_repo, repository, _mailer, mailer_ptr, metrics, user) = setup().await;
        let server = test_server_config();
        let email = test_email_config();

        let first = issue_reset_token(&repository, &mailer_ptr, &metrics, &server, &email, &user)
            .await
            .unwrap();
        let second = issue_reset_token(&repository, &mailer_ptr, &metrics, &server, &email, &user)
            .await
            .unwrap();

        assert!(find_active_reset_token(&repository, &first)
            .await
            .unwrap()
            .is_none());
        assert!(find_active_reset_token(&repository, &second)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn used_token_reads_as_absent() {
        // ---
        let (_repo, repository, _mailer, mailer_ptr, metrics, user) = setup().await;

        let token = issue_reset_token(
            &repository,
            &mailer_ptr,
            &metrics,
            &test_server_config(),
            &test_email_config(),
            &user,
        )
        .await
        .unwrap();

        let record = find_active_reset_token(&repository, &token)
            .await
            .unwrap()
            .unwrap();
        repository.mark_reset_token_used(record.id).await.unwrap();

        assert!(find_active_reset_token(&repository, &token)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn expired_token_reads_as_absent() {
        // ---
        let (repo, repository, _mailer, mailer_ptr, metrics, user) = setup().await;

        let token = issue_reset_token(
            &repository,
            &mailer_ptr,
            &metrics,
            &test_server_config(),
            &test_email_config(),
            &user,
        )
        .await
        .unwrap();

        // Push the row past expires_at; it still exists but is inactive
        repo.age_reset_tokens(user.id, ChronoDuration::minutes(11));

        assert!(find_active_reset_token(&repository, &token)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unknown_token_reads_as_absent() {
        // ---
        let (_repo, repository, _mailer, _mailer_ptr, _metrics, _user) = setup().await;

        assert!(find_active_reset_token(&repository, "not-a-token")
            .await
            .unwrap()
            .is_none());
    }
}
