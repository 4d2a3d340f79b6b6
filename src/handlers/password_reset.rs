//! Password-reset flows (scopes `password_reset_request` and
//! `password_reset_confirm`).

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::net::SocketAddr;

use crate::app_state::AppState;
use crate::handlers::flow::{infrastructure_error, Attempt};
use crate::handlers::shared_types::ErrorResponse;
use crate::handlers::validate::{email_is_valid, password_problem};
use crate::password_reset::{find_active_reset_token, issue_reset_token};
use crate::security::hash_password;
use crate::throttle::{EmailField, Scope};

/// Response body both the found and not-found request paths share.
const REQUEST_ACCEPTED: &str = "If an account exists for that address, a reset link has been sent.";

const INVALID_TOKEN: &str = "This password reset link is invalid or has expired.";

#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
    // ---
    #[serde(default)]
    pub email: Option<EmailField>,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmBody {
    // ---
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetProbeQuery {
    // ---
    #[serde(default)]
    pub token: String,
}

/// `POST /auth/password-reset/request`
///
/// Anti-enumeration: the response is byte-identical whether or not the
/// account exists; only a found account triggers token issuance and
/// email dispatch.
pub async fn request_reset(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<ResetRequestBody>,
) -> Response {
    // ---
    let email = body
        .email
        .and_then(EmailField::into_value)
        .map(|e| crate::throttle::normalize_email(&e))
        .filter(|e| !e.is_empty());

    let attempt = match Attempt::begin(
        &state,
        Scope::PasswordResetRequest,
        &headers,
        peer,
        email.as_deref(),
    )
    .await
    {
        Ok(attempt) => attempt,
        Err(response) => return response,
    };

    let Some(email) = email.filter(|e| email_is_valid(e)) else {
        let body = ErrorResponse::new("A valid email address is required.");
        return attempt
            .fail(&state, (StatusCode::BAD_REQUEST, Json(body)).into_response())
            .await;
    };

    match state.repository().get_user_by_email(&email).await {
        Ok(Some(user)) => {
            if let Err(err) = issue_reset_token(
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
        }
        Ok(None) => {
            // Deliberately indistinguishable from the found path.
            tracing::info!(ip = %attempt.identity.ip, "reset requested for unknown email");
        }
        Err(err) => return infrastructure_error(&attempt, &state, err),
    }

    let body = serde_json::json!({ "message": REQUEST_ACCEPTED });
    attempt
        .succeed(&state, (StatusCode::OK, Json(body)).into_response())
        .await
}

/// `GET /auth/password-reset/confirm?token=`
///
/// Probe for the emailed link: tells the form whether to render the
/// new-password fields or the invalid-token page. Never moves counters
/// except reporting an existing block.
pub async fn probe_reset(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<ResetProbeQuery>,
) -> Response {
    // ---
    let record = match find_active_reset_token(state.repository(), &query.token).await {
        Ok(record) => record,
        Err(err) => {
            tracing::error!("infrastructure failure: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal error")),
            )
                .into_response();
        }
    };
    if record.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(INVALID_TOKEN)),
        )
            .into_response();
    }

    // Counters for this scope key on the token itself (email position).
    let attempt = match Attempt::begin(
        &state,
        Scope::PasswordResetConfirm,
        &headers,
        peer,
        Some(&query.token),
    )
    .await
    {
        Ok(attempt) => attempt,
        Err(response) => return response,
    };

    let body = serde_json::json!({ "valid": true });
    attempt.finish(&state, (StatusCode::OK, Json(body)).into_response())
}

/// `POST /auth/password-reset/confirm`
///
/// An invalid token renders before any counter bookkeeping; with a valid
/// token, weak passwords count as failures and success rotates the
/// credential, consumes the token, and clears the counters.
pub async fn confirm_reset(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<ResetConfirmBody>,
) -> Response {
    // ---
    let record = match find_active_reset_token(state.repository(), &body.token).await {
        Ok(record) => record,
        Err(err) => {
            tracing::error!("infrastructure failure: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal error")),
            )
                .into_response();
        }
    };
    let Some(record) = record else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(INVALID_TOKEN)),
        )
            .into_response();
    };

    let attempt = match Attempt::begin(
        &state,
        Scope::PasswordResetConfirm,
        &headers,
        peer,
        Some(&body.token),
    )
    .await
    {
        Ok(attempt) => attempt,
        Err(response) => return response,
    };

    if let Some(problem) = password_problem(&body.new_password) {
        let body = ErrorResponse::new(problem);
        return attempt
            .fail(&state, (StatusCode::BAD_REQUEST, Json(body)).into_response())
            .await;
    }

    let password_hash = match hash_password(&body.new_password) {
        Ok(hash) => hash,
        Err(err) => return infrastructure_error(&attempt, &state, err),
    };
    if let Err(err) = state
        .repository()
        .set_password(record.user_id, &password_hash)
        .await
    {
        return infrastructure_error(&attempt, &state, err);
    }
    if let Err(err) = state.repository().mark_reset_token_used(record.id).await {
        return infrastructure_error(&attempt, &state, err);
    }

    tracing::info!(user_id = %record.user_id, "password reset completed");
    let body = serde_json::json!({ "message": "Your password has been updated." });
    attempt
        .succeed(&state, (StatusCode::OK, Json(body)).into_response())
        .await
}
