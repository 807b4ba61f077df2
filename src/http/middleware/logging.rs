//! Entry/exit logging stage.
//!
//! Logs exactly once on the way in and once on the way out; log emission
//! never blocks the response.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::http::context::RequestContext;

pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::of(&request);

    tracing::info!(
        request_id = %ctx.correlation_id,
        method = %ctx.method,
        path = %ctx.path,
        remote = %ctx.remote_ip,
        "Incoming request"
    );

    let start = Instant::now();
    let response = next.run(request).await;

    tracing::info!(
        request_id = %ctx.correlation_id,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Response sent"
    );

    response
}
