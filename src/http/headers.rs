//! Gateway header names and injection helpers.

use axum::http::{HeaderMap, HeaderValue};

pub const REQUEST_ID: &str = "x-request-id";
pub const REQUEST_TIMESTAMP: &str = "x-request-timestamp";
pub const RESPONSE_TIMESTAMP: &str = "x-response-timestamp";
pub const GATEWAY_ID_HEADER: &str = "x-gateway-id";
pub const GATEWAY_VERSION_HEADER: &str = "x-gateway-version";
pub const CLIENT_IP: &str = "x-client-ip";
pub const FORWARDED_USER_AGENT: &str = "x-user-agent";
pub const USER_ID: &str = "x-user-id";
pub const USER_ROLE: &str = "x-user-role";
pub const USER_EMAIL: &str = "x-user-email";

pub const GATEWAY_ID: &str = "banking-gateway";
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

const CSP_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; \
    font-src 'self'; \
    connect-src 'self'; \
    media-src 'self'; \
    object-src 'none'; \
    base-uri 'self'; \
    form-action 'self'";

/// Timestamp format used in gateway headers and error envelopes.
pub fn timestamp_now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Stamp the gateway identity onto a header map (requests and responses).
pub fn apply_gateway_identity(headers: &mut HeaderMap) {
    headers.insert(GATEWAY_ID_HEADER, HeaderValue::from_static(GATEWAY_ID));
    headers.insert(
        GATEWAY_VERSION_HEADER,
        HeaderValue::from_static(GATEWAY_VERSION),
    );
}

/// Inject the standard security header set.
///
/// Applied to every response, success or error. API paths additionally get
/// no-store cache directives so intermediaries never retain account data.
pub fn apply_security_headers(headers: &mut HeaderMap, path: &str) {
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );
    headers.insert("content-security-policy", HeaderValue::from_static(CSP_POLICY));

    if path.contains("/api/") && !path.contains("/public/") {
        headers.insert(
            "cache-control",
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert("pragma", HeaderValue::from_static("no-cache"));
        headers.insert("expires", HeaderValue::from_static("0"));
    }
}
