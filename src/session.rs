//! Session issuance for authenticated users.
//!
//! Sessions are server-side rows holding only the SHA-256 digest of the
//! bearer token; the raw token lives in the client cookie and is never
//! persisted.

use anyhow::Result;
use chrono::Duration as ChronoDuration;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{RepositoryPtr, Session};
use crate::security::{hash_token, random_token_hex};

/// Cookie carrying the raw session token.
pub const SESSION_COOKIE: &str = "ag_session";

// ---

/// A freshly issued session: the raw token for the cookie plus its row.
#[derive(Debug)]
pub struct SessionInfo {
    // ---
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Create a session row and return the raw token exactly once.
pub async fn create_session(
    repository: &RepositoryPtr,
    user_id: Uuid,
    ttl: Duration,
) -> Result<SessionInfo> {
    // ---
    let token = random_token_hex(32);
    let session = Session::new(
        user_id,
        hash_token(&token),
        ChronoDuration::seconds(ttl.as_secs() as i64),
    );
    let expires_at = session.expires_at;

    repository.create_session(session).await?;
    tracing::info!(%user_id, "session created");

    Ok(SessionInfo {
        token,
        user_id,
        expires_at,
    })
}

/// Render the session Set-Cookie value.
pub fn session_cookie(token: &str, ttl: Duration, debug: bool) -> String {
    // ---
    let secure = if debug { "" } else { "; Secure" };
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}{secure}",
        ttl.as_secs()
    )
}
