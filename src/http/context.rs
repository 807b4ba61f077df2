//! Per-request context threaded through every pipeline stage.

use axum::body::Body;
use axum::http::Request;
use chrono::{DateTime, Utc};
use std::time::Instant;
use uuid::Uuid;

/// Identity extracted from a validated bearer token.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub user_id: String,
    pub role: String,
    pub email: String,
}

/// Correlation and routing facts about one request.
///
/// Created by the correlation stage before anything else runs, stored in the
/// request extensions, and available to every later stage including error
/// paths without re-parsing headers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id: reused from X-Request-ID or freshly generated.
    pub correlation_id: String,

    /// Wall-clock arrival time (for envelopes and headers).
    pub received_at: DateTime<Utc>,

    /// Monotonic arrival time (for latency).
    pub started: Instant,

    /// Normalized request path.
    pub path: String,

    /// Request method.
    pub method: String,

    /// Client source address.
    pub remote_ip: String,

    /// Populated only after successful authentication.
    pub identity: Option<ClientIdentity>,
}

impl RequestContext {
    pub fn new(correlation_id: String, method: String, path: String, remote_ip: String) -> Self {
        Self {
            correlation_id,
            received_at: Utc::now(),
            started: Instant::now(),
            path,
            method,
            remote_ip,
            identity: None,
        }
    }

    /// Context stored on the request, or a fresh one if the correlation
    /// stage somehow did not run (fallback paths only).
    pub fn of(request: &Request<Body>) -> Self {
        request
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| {
                Self::new(
                    Uuid::new_v4().to_string(),
                    request.method().to_string(),
                    request.uri().path().to_string(),
                    "unknown".to_string(),
                )
            })
    }

    /// Throttle key: per account once authenticated, per address before.
    pub fn client_key(&self) -> String {
        crate::limit::RateLimiter::client_key(
            self.identity.as_ref().map(|i| i.user_id.as_str()),
            &self.remote_ip,
        )
    }
}
