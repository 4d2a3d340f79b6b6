use anyhow::Result;

use crate::domain::{EmailMessage, Mailer};

/// Transport that writes deliveries to the log instead of an SMTP relay.
pub struct LogMailer;

impl LogMailer {
    // ---
    pub fn new() -> Self {
        LogMailer
    }
}

impl Default for LogMailer {
    // ---
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Mailer for LogMailer {
    // ---
    async fn send(&self, message: EmailMessage) -> Result<()> {
        // ---
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "email delivered (log transport)"
        );
        tracing::debug!(body = %message.text_body, "email body");
        Ok(())
    }
}
