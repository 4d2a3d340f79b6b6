use anyhow::Result;
use std::sync::Arc;

/// Secondary, coarser lockout layered on top of the attempt throttle.
///
/// The state behind this decision (consecutive-failure tracking with its
/// own cooldown) belongs to an external policy; the login flow only asks
/// the question. A positive answer renders the same lockout response as
/// the primary throttle.
#[async_trait::async_trait]
pub trait LockoutPolicy: Send + Sync {
    // ---
    /// Whether the (ip, email) pair is currently locked out.
    async fn is_locked_out(&self, ip: &str, email: &str) -> Result<bool>;
}

/// Type alias for any backend that implements LockoutPolicy.
pub type LockoutPolicyPtr = Arc<dyn LockoutPolicy>;

/// Default policy: never locked out.
pub struct NoopLockout;

#[async_trait::async_trait]
impl LockoutPolicy for NoopLockout {
    // ---
    async fn is_locked_out(&self, _ip: &str, _email: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Creates the no-op lockout policy.
pub fn create_noop_lockout() -> LockoutPolicyPtr {
    // ---
    Arc::new(NoopLockout)
}
