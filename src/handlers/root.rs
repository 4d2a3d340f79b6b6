use axum::response::IntoResponse;

pub async fn root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Welcome to the AuthGuard API 👋
Version: {version}

Available endpoints:
  - POST /auth/register                     - Create an account (sends a verification code)
  - POST /auth/login                        - Log in with email + password
  - POST /auth/verify                       - Confirm an email with its 6-digit code
  - POST /auth/verify/resend                - Re-send the verification code
  - POST /auth/password-reset/request       - Request a password reset link
  - GET  /auth/password-reset/confirm       - Check a reset token from the emailed link
  - POST /auth/password-reset/confirm       - Set a new password with a reset token
  - POST /admin/rate-limits/clear           - Staff: clear rate-limit counters
  - GET  /health                            - Light health check
  - GET  /health?mode=full                  - Full health check (includes Redis)
  - GET  /metrics                           - Prometheus metrics

All authentication flows are rate limited per IP, fingerprint, and IP+email.
"#
    )
}
