//! Counter-key construction for throttled scopes.
//!
//! Every attempt is counted along up to three identity dimensions: client
//! IP, fingerprint, and the IP+email composite. Key layout is
//! `rl:{scope}:{dimension}:{value}` and the ordering (ip, fp, composite)
//! is stable so tests and audit logs stay deterministic.

use serde::Deserialize;

use crate::config::ThrottleConfig;

// ---

/// A throttled action category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    // ---
    Verify,
    Login,
    Register,
    PasswordResetRequest,
    PasswordResetConfirm,
}

/// All scopes, in the order administrative clears walk them.
pub const SCOPES: [Scope; 5] = [
    Scope::Verify,
    Scope::Login,
    Scope::Register,
    Scope::PasswordResetRequest,
    Scope::PasswordResetConfirm,
];

impl Scope {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            Scope::Verify => "verify",
            Scope::Login => "login",
            Scope::Register => "register",
            Scope::PasswordResetRequest => "password_reset_request",
            Scope::PasswordResetConfirm => "password_reset_confirm",
        }
    }

    /// Parse a scope name, as submitted to the admin clear endpoint.
    pub fn parse(name: &str) -> Option<Self> {
        // ---
        match name {
            "verify" => Some(Scope::Verify),
            "login" => Some(Scope::Login),
            "register" => Some(Scope::Register),
            "password_reset_request" => Some(Scope::PasswordResetRequest),
            "password_reset_confirm" => Some(Scope::PasswordResetConfirm),
            _ => None,
        }
    }

    /// Attempt ceiling for this scope under the given policy.
    pub fn limit(&self, config: &ThrottleConfig) -> i64 {
        // ---
        match self {
            Scope::Verify => config.verify_limit,
            Scope::Login => config.login_limit,
            Scope::Register => config.register_limit,
            Scope::PasswordResetRequest => config.reset_request_limit,
            Scope::PasswordResetConfirm => config.reset_confirm_limit,
        }
    }
}

// ---

/// Email field as submitted by clients.
///
/// Form-style submissions may deliver the address as a single string or a
/// list of strings. The union is normalized away right here at the
/// boundary; core logic only ever sees `Option<String>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EmailField {
    // ---
    One(String),
    Many(Vec<String>),
}

impl EmailField {
    // ---
    /// First submitted value, if any.
    pub fn into_value(self) -> Option<String> {
        // ---
        match self {
            EmailField::One(value) => Some(value),
            EmailField::Many(values) => values.into_iter().next(),
        }
    }
}

/// Trim and lowercase an email for use as a counter dimension.
pub fn normalize_email(raw: &str) -> String {
    // ---
    raw.trim().to_lowercase()
}

/// Build the counter keys for one attempt.
///
/// Always yields the ip and fingerprint keys; a non-empty normalized email
/// adds the composite key.
pub fn build_keys(scope: Scope, ip: &str, email: Option<&str>, fingerprint: &str) -> Vec<String> {
    // ---
    let scope = scope.as_str();
    let mut keys = vec![
        format!("rl:{scope}:ip:{ip}"),
        format!("rl:{scope}:fp:{fingerprint}"),
    ];

    let email_key = normalize_email(email.unwrap_or(""));
    if !email_key.is_empty() {
        keys.push(format!("rl:{scope}:ip_email:{ip}:{email_key}"));
    }
    keys
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn builds_ip_and_fp_keys() {
        // ---
        let keys = build_keys(Scope::Login, "1.2.3.4", None, "fp123");

        assert_eq!(
            keys,
            vec![
                "rl:login:ip:1.2.3.4".to_string(),
                "rl:login:fp:fp123".to_string(),
            ]
        );
    }

    #[test]
    fn builds_email_key_when_provided() {
        // ---
        let keys = build_keys(Scope::Login, "1.2.3.4", Some("user@example.com"), "fp123");

        assert_eq!(keys.len(), 3);
        assert_eq!(keys[2], "rl:login:ip_email:1.2.3.4:user@example.com");
    }

    #[test]
    fn email_is_lowercased_and_trimmed() {
        // ---
        let keys = build_keys(Scope::Login, "1.2.3.4", Some("  USER@Example.COM "), "fp");

        assert_eq!(keys[2], "rl:login:ip_email:1.2.3.4:user@example.com");
    }

    #[test]
    fn handles_email_list() {
        // ---
        let email = EmailField::Many(vec![
            "first@example.com".to_string(),
            "second@example.com".to_string(),
        ])
        .into_value();
        let keys = build_keys(Scope::Register, "1.2.3.4", email.as_deref(), "fp");

        assert_eq!(keys[2], "rl:register:ip_email:1.2.3.4:first@example.com");
    }

    #[test]
    fn handles_empty_email_list() {
        // ---
        let email = EmailField::Many(vec![]).into_value();
        let keys = build_keys(Scope::Register, "1.2.3.4", email.as_deref(), "fp");

        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn handles_empty_email_string() {
        // ---
        let keys = build_keys(Scope::Login, "1.2.3.4", Some("   "), "fp");

        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn scope_names_are_stable() {
        // ---
        let names: Vec<&str> = SCOPES.iter().map(|s| s.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "verify",
                "login",
                "register",
                "password_reset_request",
                "password_reset_confirm",
            ]
        );
    }
}
