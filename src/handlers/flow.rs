//! Shared throttle wrapper for the protected flows.
//!
//! Every flow follows the same shape: resolve the client identity, check
//! the counters before acting, then record the outcome (increment on
//! failure, reset on success). `Attempt` carries that state through one
//! handler invocation; `finish` attaches the fingerprint cookie so fresh
//! clients get their token persisted on every outcome.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::net::SocketAddr;

use crate::app_state::AppState;
use crate::handlers::shared_types::ErrorResponse;
use crate::throttle::{
    attach_fingerprint_cookie, attempt_keys, increment, is_blocked, reset, resolve_identity,
    ClientIdentity, Scope,
};

// ---

/// One throttled attempt in flight.
pub(crate) struct Attempt {
    // ---
    pub identity: ClientIdentity,
    pub keys: Vec<String>,
    scope: Scope,
}

impl Attempt {
    /// Resolve the identity and run the pre-action block check.
    ///
    /// `Err` carries the finished response: 429 with the configured
    /// lockout message, or 500 when the counter backend is unreachable.
    pub(crate) async fn begin(
        state: &AppState,
        scope: Scope,
        headers: &HeaderMap,
        peer: SocketAddr,
        email: Option<&str>,
    ) -> Result<Attempt, Response> {
        // ---
        let peer_ip = peer.ip().to_string();
        let identity = resolve_identity(&state.config().throttle, headers, Some(&peer_ip));
        let keys = attempt_keys(scope, &identity.ip, email, &identity.fingerprint);

        let limit = scope.limit(&state.config().throttle);
        let blocked = is_blocked(state.counter_store().as_ref(), &keys, limit)
            .await
            .map_err(|err| {
                tracing::error!("counter store unavailable: {err}");
                internal_error(&identity, state)
            })?;

        let attempt = Attempt {
            identity,
            keys,
            scope,
        };
        if blocked {
            return Err(attempt.blocked(state));
        }
        Ok(attempt)
    }

    /// Render the lockout response and log the audit event.
    pub(crate) fn blocked(&self, state: &AppState) -> Response {
        // ---
        tracing::warn!(
            scope = self.scope.as_str(),
            ip = %self.identity.ip,
            fingerprint = %self.identity.fingerprint,
            "request blocked by rate limit"
        );
        state.metrics().record_throttle_blocked(self.scope.as_str());

        let body = ErrorResponse::new(state.config().throttle.lockout_message.clone());
        self.finish(state, (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response())
    }

    /// Record a failed attempt, then render `response`.
    pub(crate) async fn fail(&self, state: &AppState, response: Response) -> Response {
        // ---
        state.metrics().record_attempt_recorded(self.scope.as_str());
        if let Err(err) = increment(
            state.counter_store().as_ref(),
            &self.keys,
            state.config().throttle.cooldown,
        )
        .await
        {
            tracing::error!("counter store unavailable: {err}");
            return internal_error(&self.identity, state);
        }
        self.finish(state, response)
    }

    /// Clear the penalty after success, then render `response`.
    pub(crate) async fn succeed(&self, state: &AppState, response: Response) -> Response {
        // ---
        if let Err(err) = reset(state.counter_store().as_ref(), &self.keys).await {
            tracing::error!("counter store unavailable: {err}");
            return internal_error(&self.identity, state);
        }
        self.finish(state, response)
    }

    /// Render a response without touching the counters (used by flows
    /// whose outcome is neither a countable failure nor a reset).
    pub(crate) fn finish(&self, state: &AppState, response: Response) -> Response {
        // ---
        attach_fingerprint_cookie(
            response,
            &self.identity.fingerprint,
            self.identity.should_set_cookie,
            state.config().server.debug,
        )
    }
}

/// 500 with the fingerprint cookie still attached.
fn internal_error(identity: &ClientIdentity, state: &AppState) -> Response {
    // ---
    let response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("internal error")),
    )
        .into_response();
    attach_fingerprint_cookie(
        response,
        &identity.fingerprint,
        identity.should_set_cookie,
        state.config().server.debug,
    )
}

/// 500 for repository/mailer failures inside a flow.
pub(crate) fn infrastructure_error(attempt: &Attempt, state: &AppState, err: anyhow::Error) -> Response {
    // ---
    tracing::error!("infrastructure failure: {err}");
    internal_error(&attempt.identity, state)
}
