//! Staff-only rate-limit administration.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::handlers::shared_types::ErrorResponse;
use crate::security::constant_time_equal;
use crate::throttle::{clear_limits, Scope, SCOPES};

/// Header carrying the shared admin secret.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug, Deserialize)]
pub struct ClearLimitsRequest {
    // ---
    /// Scope names to clear; all scopes when omitted.
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
}

/// `POST /admin/rate-limits/clear`
///
/// Un-blocks a client by deleting its counters. Guarded by a
/// constant-time comparison against the configured admin token; an
/// unconfigured token rejects every caller.
pub async fn clear_rate_limits(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ClearLimitsRequest>,
) -> Response {
    // ---
    let authorized = match (
        state.config().server.admin_token.as_deref(),
        headers.get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok()),
    ) {
        (Some(expected), Some(presented)) => constant_time_equal(expected, presented),
        _ => false,
    };
    if !authorized {
        tracing::warn!("rejected admin rate-limit clear");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("unauthorized")),
        )
            .into_response();
    }

    let scopes: Vec<Scope> = match &body.scopes {
        None => SCOPES.to_vec(),
        Some(names) => {
            let mut scopes = Vec::with_capacity(names.len());
            for name in names {
                match Scope::parse(name) {
                    Some(scope) => scopes.push(scope),
                    None => {
                        let body = ErrorResponse::new(format!("unknown scope: {name}"));
                        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
                    }
                }
            }
            scopes
        }
    };

    let cleared = match clear_limits(
        state.counter_store().as_ref(),
        &scopes,
        body.ip.as_deref(),
        body.email.as_deref(),
        body.fingerprint.as_deref(),
    )
    .await
    {
        Ok(cleared) => cleared,
        Err(err) => {
            tracing::error!("counter store unavailable: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal error")),
            )
                .into_response();
        }
    };

    tracing::warn!(
        count = cleared.len(),
        ip = body.ip.as_deref().unwrap_or("-"),
        email = body.email.as_deref().unwrap_or("-"),
        fingerprint = body.fingerprint.as_deref().unwrap_or("-"),
        "rate limits cleared by staff"
    );
    let count = cleared.len();
    let body = serde_json::json!({ "cleared": cleared, "count": count });
    (StatusCode::OK, Json(body)).into_response()
}
