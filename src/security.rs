//! Crypto helpers for codes, tokens, and passwords.
//!
//! Verification codes are short-lived cleartext secrets; reset and session
//! tokens are high-entropy values stored only as SHA-256 digests.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::Engine;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

// ---

/// Generate a random 6-digit numeric verification code.
pub fn generate_verification_code() -> String {
    // ---
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}

/// Generate a URL-safe password-reset token from 32 bytes of randomness.
pub fn generate_reset_token() -> String {
    // ---
    let mut buf = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// Generate a hex-encoded random token of `bytes` bytes of entropy.
pub fn random_token_hex(bytes: usize) -> String {
    // ---
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// SHA-256 hex digest used for token storage and lookup.
pub fn hash_token(value: &str) -> String {
    // ---
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password with Argon2 and a fresh salt.
pub fn hash_password(password: &str) -> Result<String> {
    // ---
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("password hashing failed: {e}"))
}

/// Valid Argon2 hash of a password nobody holds.
///
/// Login verifies candidate passwords against this when the account does
/// not exist, so unknown and known emails cost the same wall-clock time.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$VE0e3g7DalWHgDwou3nuRA$uC6TER156UQpk0lNQ5+jHM0l5poVjPA1he8TZebqef4";

/// Verify a password against a stored Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    // ---
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Compare two strings without early exit on the first mismatching byte.
pub fn constant_time_equal(a: &str, b: &str) -> bool {
    // ---
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    let mut diff = 0u8;
    for i in 0..a_bytes.len() {
        diff |= a_bytes[i] ^ b_bytes[i];
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn verification_code_is_six_digits() {
        // ---
        for _ in 0..20 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn reset_token_is_url_safe() {
        // ---
        let token = generate_reset_token();

        // 32 bytes of base64 without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        // Effectively never collides
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn hash_token_is_deterministic_and_distinct() {
        // ---
        let a = hash_token("first-token");
        let b = hash_token("first-token");
        let c = hash_token("second-token");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn random_token_hex_length() {
        // ---
        assert_eq!(random_token_hex(32).len(), 64);
        assert_ne!(random_token_hex(16), random_token_hex(16));
    }

    #[test]
    fn password_roundtrip() {
        // ---
        let hash = hash_password("correct horse battery").unwrap();

        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong guess", &hash).unwrap());
        // Raw password never stored verbatim
        assert!(!hash.contains("correct horse"));
    }

    #[test]
    fn dummy_hash_parses_and_rejects() {
        // ---
        // A malformed constant would surface as Err here, which the login
        // flow would map to a 500 instead of a clean 401.
        assert!(!verify_password("any guess at all", DUMMY_PASSWORD_HASH).unwrap());
        assert!(!verify_password("", DUMMY_PASSWORD_HASH).unwrap());
    }

    #[test]
    fn constant_time_equal_cases() {
        // ---
        assert!(constant_time_equal("abc123", "abc123"));
        assert!(!constant_time_equal("abc123", "abc124"));
        assert!(!constant_time_equal("short", "longer-value"));
        assert!(constant_time_equal("", ""));
    }
}
