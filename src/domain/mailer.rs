use anyhow::Result;
use std::sync::Arc;

/// An outbound email, ready for a transport.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    // ---
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Abstraction for email dispatch.
///
/// The production composition enqueues onto a retrying background task;
/// `send` returning `Ok` therefore means "accepted for delivery", never
/// "delivered". Delivery failures surface only in logs.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    // ---
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

/// Type alias for any backend that implements Mailer.
pub type MailerPtr = Arc<dyn Mailer>;
