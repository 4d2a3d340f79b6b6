//! Queued email dispatch.
//!
//! `send` only enqueues; a background task owns delivery, retrying failed
//! sends with exponential backoff up to a bounded attempt count. Callers
//! therefore treat "enqueued" as success and a slow transport never
//! blocks a request. Delivery failures surface only in the log.

use anyhow::{anyhow, Result};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::domain::{EmailMessage, Mailer, MailerPtr};

/// Queue depth before enqueueing applies backpressure.
const QUEUE_CAPACITY: usize = 1024;

// ---

/// [`Mailer`] that hands messages to a background delivery task.
pub struct QueuedMailer {
    // ---
    tx: mpsc::Sender<EmailMessage>,
}

impl QueuedMailer {
    /// Spawn the delivery task and return the enqueue handle.
    ///
    /// `max_retries` is the number of redeliveries after the first
    /// failure; `backoff` is the delay before the first retry and
    /// doubles each time.
    pub fn spawn(transport: MailerPtr, max_retries: u32, backoff: Duration) -> Self {
        // ---
        let (tx, mut rx) = mpsc::channel::<EmailMessage>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            // ---
            while let Some(message) = rx.recv().await {
                deliver_with_retry(transport.as_ref(), message, max_retries, backoff).await;
            }
        });

        Self { tx }
    }
}

async fn deliver_with_retry(
    transport: &dyn Mailer,
    message: EmailMessage,
    max_retries: u32,
    backoff: Duration,
) {
    // ---
    let mut delay = backoff;
    for attempt in 0..=max_retries {
        match transport.send(message.clone()).await {
            Ok(()) => return,
            Err(err) if attempt < max_retries => {
                tracing::warn!(
                    to = %message.to,
                    attempt = attempt + 1,
                    "email delivery failed, retrying in {}s: {err}",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => {
                tracing::error!(
                    to = %message.to,
                    subject = %message.subject,
                    "email delivery abandoned after {} attempts: {err}",
                    max_retries + 1
                );
            }
        }
    }
}

#[async_trait::async_trait]
impl Mailer for QueuedMailer {
    // ---
    async fn send(&self, message: EmailMessage) -> Result<()> {
        // ---
        self.tx
            .send(message)
            .await
            .map_err(|_| anyhow!("email queue closed"))
    }
}
