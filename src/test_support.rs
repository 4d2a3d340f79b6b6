//! Shared in-process test doubles.
//!
//! The lifecycle tests need a stateful repository and a mailer that
//! records what it was asked to deliver; both are shared here so every
//! unit test builds on the same fixtures.

use anyhow::Result;
use std::sync::Mutex;

use crate::config::{EmailConfig, ServerConfig};
use crate::domain::{EmailMessage, Mailer};

// The memory adapter doubles as the repository fixture; its clock and
// inspection helpers are compiled for tests only.
pub use crate::infrastructure::MemoryRepository as InMemoryRepository;

// ---

/// [`Mailer`] that records every message instead of sending.
#[derive(Default)]
pub struct RecordingMailer {
    // ---
    messages: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        // ---
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    // ---
    async fn send(&self, message: EmailMessage) -> Result<()> {
        // ---
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

// ---

/// Server config for tests, debug mode, local site URL.
pub fn test_server_config() -> ServerConfig {
    // ---
    ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        debug: true,
        admin_token: Some("test-admin-token".to_string()),
        session_ttl: std::time::Duration::from_secs(604_800),
        site_url: "http://localhost:8080".to_string(),
    }
}

/// Email config for tests: 10-minute tokens, instant retries.
pub fn test_email_config() -> EmailConfig {
    // ---
    EmailConfig {
        from_address: "no-reply@example.com".to_string(),
        reset_token_ttl: std::time::Duration::from_secs(600),
        max_retries: 1,
        retry_backoff: std::time::Duration::from_millis(1),
    }
}
