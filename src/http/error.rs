//! Uniform error normalization.
//!
//! Every terminal failure, whatever stage raised it, renders through the same
//! envelope so clients see one response shape. Internal diagnostic detail is
//! logged server-side and never echoed verbatim.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::http::context::RequestContext;
use crate::http::headers;

/// Everything that can terminate a request inside the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing, malformed or expired bearer token. Terminal; never retried.
    #[error("authentication failed: {0}")]
    Unauthenticated(#[from] crate::auth::AuthError),

    /// Authorization/permission failure.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// Rate-limit admission denied for this window.
    #[error("throttled, retry after {retry_after_secs}s")]
    Throttled { retry_after_secs: u64 },

    /// Breaker open; no downstream attempt was made.
    #[error("circuit open for {service}")]
    CircuitOpen { service: String },

    /// Per-call timeout elapsed; counted as a breaker failure.
    #[error("call to {service} timed out")]
    DownstreamTimeout { service: String },

    /// Connection-level failure reaching the downstream.
    #[error("call to {service} failed: {detail}")]
    DownstreamUnreachable { service: String, detail: String },

    /// Malformed input detected before forwarding.
    #[error("invalid request: {0}")]
    Validation(String),

    /// No service owns the requested path.
    #[error("no route for path")]
    UnknownRoute,

    /// Anything uncaught.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::CircuitOpen { .. }
            | GatewayError::DownstreamTimeout { .. }
            | GatewayError::DownstreamUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnknownRoute => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the envelope.
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Unauthenticated(_) => "UNAUTHORIZED",
            GatewayError::Forbidden(_) => "ACCESS_DENIED",
            GatewayError::Throttled { .. } => "RATE_LIMIT_EXCEEDED",
            GatewayError::CircuitOpen { .. }
            | GatewayError::DownstreamTimeout { .. }
            | GatewayError::DownstreamUnreachable { .. } => "SERVICE_UNAVAILABLE",
            GatewayError::Validation(_) => "INVALID_REQUEST",
            GatewayError::UnknownRoute => "ROUTE_NOT_FOUND",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Coarse classification tag for the envelope.
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::Unauthenticated(_) => "AuthenticationError",
            GatewayError::Forbidden(_) => "AuthorizationError",
            GatewayError::Throttled { .. } => "ThrottledError",
            GatewayError::CircuitOpen { .. } => "CircuitOpenError",
            GatewayError::DownstreamTimeout { .. } => "DownstreamTimeoutError",
            GatewayError::DownstreamUnreachable { .. } => "DownstreamUnavailableError",
            GatewayError::Validation(_) => "ValidationError",
            GatewayError::UnknownRoute => "RouteNotFoundError",
            GatewayError::Internal(_) => "UnclassifiedError",
        }
    }

    /// Client-facing message. Generic by design; internal detail stays in
    /// the server logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Unauthenticated(_) => "Authentication required.",
            GatewayError::Forbidden(_) => "Access denied.",
            GatewayError::Throttled { .. } => {
                "Too many requests. Please retry after the indicated delay."
            }
            GatewayError::CircuitOpen { .. }
            | GatewayError::DownstreamTimeout { .. }
            | GatewayError::DownstreamUnreachable { .. } => {
                "Service temporarily unavailable. Please try again later."
            }
            GatewayError::Validation(_) => "Invalid request parameters.",
            GatewayError::UnknownRoute => "No matching route found.",
            GatewayError::Internal(_) => "An unexpected error occurred. Please try again later.",
        }
    }
}

/// The uniform failure response body.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(rename = "errorCode")]
    pub error_code: &'static str,
    pub data: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub timestamp: String,
    pub path: String,
    pub method: String,
    #[serde(rename = "error-type")]
    pub error_type: &'static str,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// Map a failure to the uniform response envelope.
///
/// This is the single exit point for every terminal error in the pipeline.
pub fn normalize(error: &GatewayError, ctx: &RequestContext) -> Response {
    let status = error.status();

    // Full detail server-side only.
    if status.is_server_error() {
        tracing::error!(
            request_id = %ctx.correlation_id,
            path = %ctx.path,
            error_type = error.error_type(),
            detail = %error,
            "Request failed"
        );
    } else {
        tracing::warn!(
            request_id = %ctx.correlation_id,
            path = %ctx.path,
            error_type = error.error_type(),
            detail = %error,
            "Request rejected"
        );
    }

    let envelope = ErrorEnvelope {
        success: false,
        message: error.public_message().to_string(),
        error_code: error.error_code(),
        data: ErrorDetail {
            timestamp: headers::timestamp_now(),
            path: ctx.path.clone(),
            method: ctx.method.clone(),
            error_type: error.error_type(),
            request_id: ctx.correlation_id.clone(),
        },
    };

    let body = serde_json::to_string(&envelope).unwrap_or_else(|_| {
        r#"{"success":false,"message":"An unexpected error occurred.","errorCode":"INTERNAL_ERROR"}"#
            .to_string()
    });

    let mut response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| status.into_response());

    // Short-circuit responses bypass the transform stage, so the produced
    // header set is stamped here as well.
    headers::apply_gateway_identity(response.headers_mut());
    if let Ok(value) = HeaderValue::from_str(&headers::timestamp_now()) {
        response
            .headers_mut()
            .insert(headers::RESPONSE_TIMESTAMP, value);
    }

    if let GatewayError::Throttled { retry_after_secs } = error {
        if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }

    response
}
