//! Registration flow (scope `register`).

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::net::SocketAddr;

use crate::app_state::AppState;
use crate::domain::NewUser;
use crate::handlers::flow::{infrastructure_error, Attempt};
use crate::handlers::shared_types::{ErrorResponse, UserResponse};
use crate::handlers::validate::{email_is_valid, password_problem};
use crate::security::hash_password;
use crate::throttle::{EmailField, Scope};
use crate::verification::issue_verification_code;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    // ---
    #[serde(default)]
    pub email: Option<EmailField>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// `POST /auth/register`
///
/// Blocked requests get 429 before any work. Validation failures and
/// duplicate emails count as failed attempts; success creates the
/// unconfirmed account, emails a verification code, and clears the
/// counters.
pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Response {
    // ---
    let email = body
        .email
        .and_then(EmailField::into_value)
        .map(|e| crate::throttle::normalize_email(&e))
        .filter(|e| !e.is_empty());

    let attempt = match Attempt::begin(
        &state,
        Scope::Register,
        &headers,
        peer,
        email.as_deref(),
    )
    .await
    {
        Ok(attempt) => attempt,
        Err(response) => return response,
    };

    // Local validation failures still count against the throttle.
    let Some(email) = email.filter(|e| email_is_valid(e)) else {
        let body = ErrorResponse::new("A valid email address is required.");
        return attempt
            .fail(&state, (StatusCode::BAD_REQUEST, Json(body)).into_response())
            .await;
    };
    if body.first_name.trim().is_empty() || body.last_name.trim().is_empty() {
        let body = ErrorResponse::new("First and last name are required.");
        return attempt
            .fail(&state, (StatusCode::BAD_REQUEST, Json(body)).into_response())
            .await;
    }
    if let Some(problem) = password_problem(&body.password) {
        let body = ErrorResponse::new(problem);
        return attempt
            .fail(&state, (StatusCode::BAD_REQUEST, Json(body)).into_response())
            .await;
    }

    match state.repository().get_user_by_email(&email).await {
        Ok(Some(existing)) => {
            // Distinct messages so an unverified registrant knows to
            // check their inbox rather than re-register.
            let message = if existing.email_confirmed {
                "An account with this email already exists."
            } else {
                "An account with this email exists but is not verified. Check your inbox for the verification code."
            };
            let body = ErrorResponse::new(message);
            return attempt
                .fail(&state, (StatusCode::CONFLICT, Json(body)).into_response())
                .await;
        }
        Ok(None) => {}
        Err(err) => return infrastructure_error(&attempt, &state, err),
    }

    let password_hash = match hash_password(&body.password) {
        Ok(hash) => hash,
        Err(err) => return infrastructure_error(&attempt, &state, err),
    };

    let user = match state
        .repository()
        .create_user(NewUser {
            email: email.clone(),
            password_hash,
            first_name: body.first_name.trim().to_string(),
            last_name: body.last_name.trim().to_string(),
        })
        .await
    {
        Ok(user) => user,
        Err(err) => return infrastructure_error(&attempt, &state, err),
    };

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

    tracing::info!(email = %user.email, ip = %attempt.identity.ip, "account registered");
    attempt
        .succeed(
            &state,
            (StatusCode::CREATED, Json(UserResponse::from(&user))).into_response(),
        )
        .await
}
