//! Rate-limit admission stage.
//!
//! Runs after authentication so an authenticated user is limited per account
//! id rather than per network address. Operational paths bypass admission.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::http::context::RequestContext;
use crate::http::error::{normalize, GatewayError};
use crate::http::server::AppState;
use crate::observability::metrics;

const OPERATIONAL_PREFIXES: [&str; 3] = ["/actuator", "/health", "/info"];

pub async fn throttle_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = RequestContext::of(&request);

    if OPERATIONAL_PREFIXES.iter().any(|p| ctx.path.starts_with(p)) {
        return next.run(request).await;
    }

    let key = ctx.client_key();
    if !state.limiter.try_admit(&key) {
        let key_class = if ctx.identity.is_some() { "user" } else { "ip" };
        metrics::record_rate_limited(key_class);
        tracing::warn!(request_id = %ctx.correlation_id, client = %key, "Request throttled");
        return normalize(
            &GatewayError::Throttled {
                retry_after_secs: state.limiter.retry_after_secs(),
            },
            &ctx,
        );
    }

    next.run(request).await
}
