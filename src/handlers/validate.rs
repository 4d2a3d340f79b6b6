//! Input validation shared by the registration and reset flows.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// Loose structural check; deliverability is proven by the verification
/// code, not by the pattern.
pub(crate) fn email_is_valid(email: &str) -> bool {
    // ---
    EMAIL_RE.is_match(email)
}

/// Returns the user-facing problem with a candidate password, if any.
pub(crate) fn password_problem(password: &str) -> Option<&'static str> {
    // ---
    if password.chars().count() < 8 {
        return Some("Password must be at least 8 characters long.");
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Some("Password cannot be entirely numeric.");
    }
    None
}
