// src/infrastructure/email/mod.rs
mod log_mailer;
mod queued_mailer;

pub use log_mailer::LogMailer;
pub use queued_mailer::QueuedMailer;

use crate::config::EmailConfig;
use crate::domain::MailerPtr;
use std::sync::Arc;

/// Creates the log-only transport mailer.
///
/// The seam where a real SMTP transport would plug in; deliveries are
/// written to the structured log instead.
pub fn create_log_mailer() -> MailerPtr {
    // ---
    Arc::new(LogMailer::new())
}

/// Creates the production mailer composition: a bounded queue in front of
/// the given transport, drained by a background task with bounded retries
/// and exponential backoff.
pub fn create_queued_mailer(transport: MailerPtr, config: &EmailConfig) -> MailerPtr {
    // ---
    Arc::new(QueuedMailer::spawn(
        transport,
        config.max_retries,
        config.retry_backoff,
    ))
}
