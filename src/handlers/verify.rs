//! Email verification flow (scope `verify`): code entry and resend.

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::net::SocketAddr;

use crate::app_state::AppState;
use crate::handlers::flow::{infrastructure_error, Attempt};
use crate::handlers::shared_types::{ErrorResponse, UserResponse};
use crate::session::{create_session, session_cookie};
use crate::throttle::{EmailField, Scope};
use crate::verification::{issue_verification_code, verify_code};

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    // ---
    #[serde(default)]
    pub email: Option<EmailField>,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    // ---
    #[serde(default)]
    pub email: Option<EmailField>,
}

/// `POST /auth/verify`
///
/// Missing fields, unknown accounts, and bad codes all count as failed
/// attempts; a correct code confirms the email, clears the counters, and
/// logs the user straight in.
pub async fn verify(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<VerifyRequest>,
) -> Response {
    // ---
    let email = body
        .email
        .and_then(EmailField::into_value)
        .map(|e| crate::throttle::normalize_email(&e))
        .filter(|e| !e.is_empty());

    let attempt = match Attempt::begin(
        &state,
        Scope::Verify,
        &headers,
        peer,
        email.as_deref(),
    )
    .await
    {
        Ok(attempt) => attempt,
        Err(response) => return response,
    };

    let code = body.code.trim().to_string();
    let (Some(email), false) = (email, code.is_empty()) else {
        let body = ErrorResponse::new("Email and verification code are required.");
        return attempt
            .fail(&state, (StatusCode::BAD_REQUEST, Json(body)).into_response())
            .await;
    };

    let user = match state.repository().get_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let body = ErrorResponse::new("No account found for this email.");
            return attempt
                .fail(&state, (StatusCode::NOT_FOUND, Json(body)).into_response())
                .await;
        }
        Err(err) => return infrastructure_error(&attempt, &state, err),
    };

    match verify_code(state.repository(), &user, &code).await {
        Ok(true) => {}
        Ok(false) => {
            let body = ErrorResponse::new("Invalid or expired verification code.");
            return attempt
                .fail(&state, (StatusCode::BAD_REQUEST, Json(body)).into_response())
                .await;
        }
        Err(err) => return infrastructure_error(&attempt, &state, err),
    }

    let session = match create_session(
        state.repository(),
        user.id,
        state.config().server.session_ttl,
    )
    .await
    {
        Ok(session) => session,
        Err(err) => return infrastructure_error(&attempt, &state, err),
    };

    // The view reflects the flip that verify_code just committed.
    let mut confirmed = UserResponse::from(&user);
    confirmed.email_confirmed = true;

    let mut response = (StatusCode::OK, Json(confirmed)).into_response();
    if let Ok(value) = HeaderValue::from_str(&session_cookie(
        &session.token,
        state.config().server.session_ttl,
        state.config().server.debug,
    )) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    attempt.succeed(&state, response).await
}

/// `POST /auth/verify/resend`
///
/// Shares the `verify` scope but only reads the counters: a blocked
/// client cannot mint codes, yet resend outcomes never move the count in
/// either direction.
pub async fn resend(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<ResendRequest>,
) -> Response {
    // ---
    let email = body
        .email
        .and_then(EmailField::into_value)
        .map(|e| crate::throttle::normalize_email(&e))
        .filter(|e| !e.is_empty());

    let attempt = match Attempt::begin(
        &state,
        Scope::Verify,
        &headers,
        peer,
        email.as_deref(),
    )
    .await
    {
        Ok(attempt) => attempt,
        Err(response) => return response,
    };

    let Some(email) = email else {
        let body = ErrorResponse::new("Email is required.");
        return attempt.finish(
            &state,
            (StatusCode::BAD_REQUEST, Json(body)).into_response(),
        );
    };

    let user = match state.repository().get_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let body = ErrorResponse::new("No account found for this email.");
            return attempt.finish(
                &state,
                (StatusCode::NOT_FOUND, Json(body)).into_response(),
            );
        }
        Err(err) => return infrastructure_error(&attempt, &state, err),
    };

    if user.email_confirmed {
        let body = ErrorResponse::new("This email address is already verified.");
        return attempt.finish(&state, (StatusCode::CONFLICT, Json(body)).into_response());
    }

    if let Err(err) = issue_verification_code(
        state.repository(),
        state.mailer(),
        state.metrics(),
        &state.config().server,
        &state.config().email,
        &user,
    )
    .await
    {
        return infrastructure_error(&attempt, &state, err);
    }

    let body = serde_json::json!({ "message": "A new verification code has been sent." });
    attempt.finish(&state, (StatusCode::OK, Json(body)).into_response())
}
