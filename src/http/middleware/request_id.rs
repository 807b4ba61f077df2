//! Correlation id stage.
//!
//! Reuses an inbound X-Request-ID or generates a fresh UUID, attaches it to
//! the forwarded request, the response, and the request context. Never
//! rejects a request.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::http::context::RequestContext;
use crate::http::headers;

pub async fn request_id_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let correlation_id = request
        .headers()
        .get(headers::REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext::new(
        correlation_id.clone(),
        request.method().to_string(),
        request.uri().path().to_string(),
        addr.ip().to_string(),
    );

    // Downstream services see the same id the client will get back.
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert(headers::REQUEST_ID, value);
    }
    request.extensions_mut().insert(ctx);

    tracing::debug!(request_id = %correlation_id, "Correlation id assigned");

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(headers::REQUEST_ID, value);
    }
    response
}
