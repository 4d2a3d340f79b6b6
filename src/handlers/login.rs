//! Login flow (scope `login`).

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::net::SocketAddr;

use crate::app_state::AppState;
use crate::handlers::flow::{infrastructure_error, Attempt};
use crate::handlers::shared_types::{ErrorResponse, UserResponse};
use crate::security::{verify_password, DUMMY_PASSWORD_HASH};
use crate::session::{create_session, session_cookie};
use crate::throttle::{EmailField, Scope};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    // ---
    #[serde(default)]
    pub email: Option<EmailField>,
    #[serde(default)]
    pub password: String,
}

/// `POST /auth/login`
///
/// Order of checks: primary throttle, secondary lockout, credentials,
/// email confirmation. Unknown accounts and wrong passwords share one
/// message and both count as failures; success clears the counters and
/// issues a session cookie.
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Response {
    // ---
    let email = body
        .email
        .and_then(EmailField::into_value)
        .map(|e| crate::throttle::normalize_email(&e))
        .filter(|e| !e.is_empty());

    let attempt = match Attempt::begin(
        &state,
        Scope::Login,
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
        return attempt
            .fail(&state, (StatusCode::BAD_REQUEST, Json(body)).into_response())
            .await;
    };

    // An external consecutive-failure lockout may veto the attempt even
    // when the primary counters allow it.
    match state.lockout().is_locked_out(&attempt.identity.ip, &email).await {
        Ok(false) => {}
        Ok(true) => return attempt.blocked(&state),
        Err(err) => return infrastructure_error(&attempt, &state, err),
    }

    let found = match state.repository().get_user_by_email(&email).await {
        Ok(found) => found,
        Err(err) => return infrastructure_error(&attempt, &state, err),
    };

    // Unknown account and wrong password render identically, and both
    // burn one hash verification so timing does not tell them apart.
    let credentials_ok = match &found {
        Some(user) => match verify_password(&body.password, &user.password_hash) {
            Ok(ok) => ok,
            Err(err) => return infrastructure_error(&attempt, &state, err),
        },
        None => {
            let _ = verify_password(&body.password, DUMMY_PASSWORD_HASH);
            false
        }
    };
    let user = match found {
        Some(user) if credentials_ok => user,
        _ => {
            tracing::info!(email = %email, ip = %attempt.identity.ip, "login failed");
            let body = ErrorResponse::new("Invalid email or password.");
            return attempt
                .fail(&state, (StatusCode::UNAUTHORIZED, Json(body)).into_response())
                .await;
        }
    };
    if !user.email_confirmed {
        tracing::info!(email = %email, "login rejected, email unconfirmed");
        let body =
            ErrorResponse::new("Email address not verified. Enter your verification code first.");
        return attempt
            .fail(&state, (StatusCode::FORBIDDEN, Json(body)).into_response())
            .await;
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

    tracing::info!(email = %user.email, ip = %attempt.identity.ip, "login succeeded");
    let mut response =
        (StatusCode::OK, Json(UserResponse::from(&user))).into_response();
    if let Ok(value) = HeaderValue::from_str(&session_cookie(
        &session.token,
        state.config().server.session_ttl,
        state.config().server.debug,
    )) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    attempt.succeed(&state, response).await
}
