//! End-to-end authentication flow tests over a live HTTP server.
//!
//! Each test spins up a fresh server, so counters and accounts never
//! leak between tests. All requests arrive from 127.0.0.1 with proxy
//! trust disabled, which makes the per-IP dimension easy to drive.

use serde_json::json;

mod common;

use common::{setup_test_env, TestServer};

const LOGIN_LIMIT: usize = 5;
const REGISTER_LIMIT: usize = 3;

async fn register_user(server: &TestServer, email: &str) {
    // ---
    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({
            "email": email,
            "password": "correct horse battery",
            "first_name": "Flow",
            "last_name": "Test"
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(response.status(), 201);
}

// ============================================================================
// Fingerprint cookie
// ============================================================================

#[tokio::test]
#[serial_test::serial]
async fn fresh_client_receives_fingerprint_cookie() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    // No fingerprint presented: the server mints one and persists it.
    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "password": "whatever" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let cookies: Vec<_> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with("ag_fp="))
        .collect();
    assert_eq!(cookies.len(), 1, "expected exactly one ag_fp cookie");
    assert!(cookies[0].contains("HttpOnly"));

    // A client that already carries a fingerprint gets nothing back.
    let response = server
        .client
        .post(server.url("/auth/login"))
        .header("x-client-fp", "existing-fingerprint")
        .json(&json!({ "password": "whatever" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    assert!(!response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("ag_fp=")));
}

// ============================================================================
// Login throttling
// ============================================================================

#[tokio::test]
#[serial_test::serial]
async fn login_blocks_after_limit_regardless_of_fingerprint() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    register_user(&server, "victim@example.com").await;

    // Failed attempts from the same IP with rotating fingerprints still
    // accumulate on the per-IP counter.
    for i in 0..LOGIN_LIMIT {
        let response = server
            .client
            .post(server.url("/auth/login"))
            .header("x-client-fp", format!("fp-{i}"))
            .json(&json!({
                "email": "victim@example.com",
                "password": "wrong-password"
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 401, "attempt {i} should be a plain failure");
    }

    // A fresh fingerprint and even a different email do not evade the block.
    let response = server
        .client
        .post(server.url("/auth/login"))
        .header("x-client-fp", "fp-fresh")
        .json(&json!({
            "email": "someone-else@example.com",
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 429);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body["error"],
        "Too many failed attempts. Please try again later."
    );
}

#[tokio::test]
#[serial_test::serial]
async fn unknown_email_login_renders_like_wrong_password() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    register_user(&server, "present@example.com").await;

    let wrong_password = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({
            "email": "present@example.com",
            "password": "not the password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    let unknown_email = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({
            "email": "absent@example.com",
            "password": "not the password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(wrong_password.status(), 401);
    assert_eq!(unknown_email.status(), 401);
    let a = wrong_password.text().await.expect("Failed to read body");
    let b = unknown_email.text().await.expect("Failed to read body");
    assert_eq!(a, b);
}

#[tokio::test]
#[serial_test::serial]
async fn unconfirmed_account_cannot_log_in() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    register_user(&server, "pending@example.com").await;

    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({
            "email": "pending@example.com",
            "password": "correct horse battery"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
#[serial_test::serial]
async fn duplicate_registration_is_rejected() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    register_user(&server, "taken@example.com").await;

    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({
            "email": "taken@example.com",
            "password": "another password",
            "first_name": "Second",
            "last_name": "Try"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    // The account is unverified, so the message points at the inbox.
    assert!(body["error"].as_str().unwrap().contains("not verified"));
}

#[tokio::test]
#[serial_test::serial]
async fn verify_requires_email_and_code() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    register_user(&server, "verifying@example.com").await;

    let response = server
        .client
        .post(server.url("/auth/verify"))
        .json(&json!({ "email": "verifying@example.com" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .post(server.url("/auth/verify"))
        .json(&json!({ "email": "verifying@example.com", "code": "000000" }))
        .send()
        .await
        .expect("Failed to send request");

    // A guessed code is rejected, not an input error
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Invalid or expired verification code.");
}

#[tokio::test]
#[serial_test::serial]
async fn resend_never_consumes_the_limit() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    // Far more requests than the verify limit allows for failures; resend
    // is informational and must not accumulate a penalty.
    for _ in 0..10 {
        let response = server
            .client
            .post(server.url("/auth/verify/resend"))
            .json(&json!({ "email": "nobody@example.com" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 404);
    }
}

// ============================================================================
// Password reset
// ============================================================================

#[tokio::test]
#[serial_test::serial]
async fn reset_request_response_is_uniform() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    register_user(&server, "resetme@example.com").await;

    let known = server
        .client
        .post(server.url("/auth/password-reset/request"))
        .json(&json!({ "email": "resetme@example.com" }))
        .send()
        .await
        .expect("Failed to send request");
    let unknown = server
        .client
        .post(server.url("/auth/password-reset/request"))
        .json(&json!({ "email": "stranger@example.com" }))
        .send()
        .await
        .expect("Failed to send request");

    // Identical status and body whether or not the account exists.
    assert_eq!(known.status(), 200);
    assert_eq!(unknown.status(), 200);
    let known_body = known.text().await.expect("Failed to read body");
    let unknown_body = unknown.text().await.expect("Failed to read body");
    assert_eq!(known_body, unknown_body);
}

#[tokio::test]
#[serial_test::serial]
async fn invalid_reset_token_never_blocks() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    // Unknown tokens are rejected outright and carry no throttle cost,
    // so hammering them keeps returning 400 rather than 429.
    for _ in 0..10 {
        let probe = server
            .client
            .get(server.url("/auth/password-reset/confirm?token=bogus"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(probe.status(), 400);

        let confirm = server
            .client
            .post(server.url("/auth/password-reset/confirm"))
            .json(&json!({ "token": "bogus", "new_password": "new password 1" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(confirm.status(), 400);
    }
}

// ============================================================================
// Administration
// ============================================================================

#[tokio::test]
#[serial_test::serial]
async fn admin_clear_requires_the_token() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/admin/rate-limits/clear"))
        .json(&json!({ "ip": "127.0.0.1" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .post(server.url("/admin/rate-limits/clear"))
        .header("x-admin-token", "not-the-token")
        .json(&json!({ "ip": "127.0.0.1" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[serial_test::serial]
async fn admin_clear_rejects_unknown_scopes() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/admin/rate-limits/clear"))
        .header("x-admin-token", "test-admin-token")
        .json(&json!({ "scopes": ["teleport"], "ip": "127.0.0.1" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[serial_test::serial]
async fn admin_clear_unblocks_a_client() {
    // ---
    setup_test_env().await;
    let server = TestServer::new().await;

    // Exhaust the register limit with invalid submissions. The email
    // varies so only the per-IP counter accumulates.
    for i in 0..REGISTER_LIMIT {
        let response = server
            .client
            .post(server.url("/auth/register"))
            .json(&json!({ "email": format!("not-an-email-{i}"), "password": "x" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 400);
    }

    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "email": "blocked@example.com", "password": "x" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 429);

    // Staff clears the register counters for this IP.
    let response = server
        .client
        .post(server.url("/admin/rate-limits/clear"))
        .header("x-admin-token", "test-admin-token")
        .json(&json!({ "scopes": ["register"], "ip": "127.0.0.1" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["count"].as_u64().unwrap() >= 1);

    // The client is served again (and fails on its own merits).
    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "email": "unblocked", "password": "x" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}
