// Gateway module - controls public API for the throttle layer
// Modules are private, only exported symbols are public

mod engine;
mod identity;
mod keys;

// Identity resolution and the cookie helper
pub use identity::{
    attach_fingerprint_cookie, get_client_ip, get_fingerprint, resolve_identity, ClientIdentity,
};

// Key construction and the boundary email type
pub use keys::{build_keys, normalize_email, EmailField, Scope, SCOPES};

// Decision engine
pub use engine::{attempt_keys, clear_limits, increment, is_blocked, reset};
