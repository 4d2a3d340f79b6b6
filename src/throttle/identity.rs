//! Client identity resolution.
//!
//! Every throttled request resolves to a `(ip, fingerprint)` pair. The IP
//! comes from the direct peer unless the deployment has explicitly opted
//! into proxy headers; the fingerprint rides a custom header or cookie and
//! is minted fresh when neither is present.

use axum::http::{header, HeaderMap, HeaderValue, Response};
use uuid::Uuid;

use crate::config::ThrottleConfig;

/// Header clients may use to carry their fingerprint directly.
pub const FINGERPRINT_HEADER: &str = "x-client-fp";

/// Cookie the service sets for clients that did not supply a fingerprint.
pub const FINGERPRINT_COOKIE: &str = "ag_fp";

/// Fingerprint cookie lifetime in seconds (30 days).
const FINGERPRINT_COOKIE_MAX_AGE: u64 = 2_592_000;

// ---

/// Per-request client identity. Computed, never stored.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    // ---
    pub ip: String,

    /// Opaque correlation token; stable once a cookie or header exists.
    pub fingerprint: String,

    /// True only when the fingerprint was minted on this request; the
    /// response must then persist it as a cookie.
    pub should_set_cookie: bool,
}

/// Whether x-forwarded-for from this peer may be honored.
///
/// Both gates must pass: the deployment opted in, and the direct peer is
/// one of the configured proxy addresses. The header is spoofable from
/// anywhere else, so an empty allow list means it is never trusted.
fn proxy_peer_is_trusted(config: &ThrottleConfig, peer_ip: Option<&str>) -> bool {
    // ---
    if !config.trust_proxy {
        return false;
    }
    let Some(peer_ip) = peer_ip else {
        return false;
    };
    !config.trusted_proxy_ips.is_empty()
        && config.trusted_proxy_ips.iter().any(|ip| ip == peer_ip)
}

/// Resolve the client IP for counter keys.
///
/// First entry of x-forwarded-for (trimmed) when the peer is a trusted
/// proxy; otherwise the peer address itself; empty string when neither
/// exists. The value is an opaque key, not a validated address.
pub fn get_client_ip(
    config: &ThrottleConfig,
    headers: &HeaderMap,
    peer_ip: Option<&str>,
) -> String {
    // ---
    if proxy_peer_is_trusted(config, peer_ip) {
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| raw.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return ip.to_string();
        }
    }
    peer_ip.unwrap_or("").to_string()
}

/// Resolve the client fingerprint.
///
/// Precedence: header, then cookie, then a freshly minted UUID. Only the
/// minted case asks the caller to set the cookie.
pub fn get_fingerprint(headers: &HeaderMap) -> (String, bool) {
    // ---
    if let Some(fp) = headers
        .get(FINGERPRINT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return (fp.to_string(), false);
    }

    if let Some(fp) = get_cookie_value(headers, FINGERPRINT_COOKIE) {
        return (fp, false);
    }

    (Uuid::new_v4().to_string(), true)
}

/// Resolve the full identity triple for one request.
pub fn resolve_identity(
    config: &ThrottleConfig,
    headers: &HeaderMap,
    peer_ip: Option<&str>,
) -> ClientIdentity {
    // ---
    let ip = get_client_ip(config, headers, peer_ip);
    let (fingerprint, should_set_cookie) = get_fingerprint(headers);

    ClientIdentity {
        ip,
        fingerprint,
        should_set_cookie,
    }
}

fn get_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    // ---
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let trimmed = part.trim();
        let Some((name, value)) = trimmed.split_once('=') else {
            continue;
        };
        if name == cookie_name {
            return Some(value.to_string());
        }
    }
    None
}

/// Render the fingerprint Set-Cookie value.
///
/// HttpOnly + SameSite=Lax, 30-day lifetime; Secure everywhere except
/// debug (non-TLS) deployments.
pub fn fingerprint_cookie(fingerprint: &str, debug: bool) -> String {
    // ---
    let secure = if debug { "" } else { "; Secure" };
    format!(
        "{FINGERPRINT_COOKIE}={fingerprint}; HttpOnly; Path=/; SameSite=Lax; \
         Max-Age={FINGERPRINT_COOKIE_MAX_AGE}{secure}"
    )
}

/// Attach the fingerprint cookie to a response when it was freshly minted.
pub fn attach_fingerprint_cookie<B>(
    mut response: Response<B>,
    fingerprint: &str,
    should_set: bool,
    debug: bool,
) -> Response<B> {
    // ---
    if should_set {
        if let Ok(value) = HeaderValue::from_str(&fingerprint_cookie(fingerprint, debug)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
