//! Request/response transform stage.
//!
//! Stamps the gateway identity and timing headers onto the forwarded request
//! and the outbound response.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::http::context::RequestContext;
use crate::http::headers;

pub async fn transform_middleware(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::of(&request);

    if let Ok(value) = HeaderValue::from_str(&headers::timestamp_now()) {
        request.headers_mut().insert(headers::REQUEST_TIMESTAMP, value);
    }
    headers::apply_gateway_identity(request.headers_mut());
    if let Ok(value) = HeaderValue::from_str(&ctx.remote_ip) {
        request.headers_mut().insert(headers::CLIENT_IP, value);
    }
    if let Some(agent) = request.headers().get(header::USER_AGENT).cloned() {
        request.headers_mut().insert(headers::FORWARDED_USER_AGENT, agent);
    }

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&headers::timestamp_now()) {
        response.headers_mut().insert(headers::RESPONSE_TIMESTAMP, value);
    }
    headers::apply_gateway_identity(response.headers_mut());

    response
}
