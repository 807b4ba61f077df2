//! Forwarding requests to downstream banking services.

use axum::{
    body::Body,
    extract::State,
    http::{
        header,
        uri::{Authority, Scheme},
        Request, Response, Uri,
    },
    response::IntoResponse,
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::http::context::RequestContext;
use crate::http::error::{normalize, GatewayError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;

/// Terminal pipeline stage: resolve the downstream service and forward.
pub async fn dispatch_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> axum::response::Response {
    let ctx = RequestContext::of(&request);

    let Some(prefix) = service_prefix(ctx.path.as_str()) else {
        metrics::record_request(&ctx.method, 404, "none", ctx.started);
        return normalize(&GatewayError::UnknownRoute, &ctx);
    };
    let Some(service) = state.config.service_for_prefix(prefix).cloned() else {
        tracing::warn!(request_id = %ctx.correlation_id, prefix, "No service for prefix");
        metrics::record_request(&ctx.method, 404, "none", ctx.started);
        return normalize(&GatewayError::UnknownRoute, &ctx);
    };
    let Some(breaker) = state.breakers.get(&service.name) else {
        // Registry is built from the same service table; this is unreachable
        // unless construction was bypassed.
        return normalize(
            &GatewayError::Internal(format!("no breaker registered for {}", service.name)),
            &ctx,
        );
    };

    if !breaker.try_acquire() {
        metrics::record_breaker_rejected(&service.name);
        metrics::record_request(&ctx.method, 503, &service.name, ctx.started);
        return normalize(&GatewayError::CircuitOpen { service: service.name }, &ctx);
    }

    let upstream = match build_upstream_request(request, &service.address) {
        Ok(req) => req,
        Err(error) => {
            // The slot was acquired but no call will be placed; a rejected
            // build is the gateway's fault, not the downstream's.
            breaker.release();
            return normalize(&error, &ctx);
        }
    };

    // Spawned so that a client disconnect (which drops this handler future)
    // does not cancel the call: its outcome must still reach the breaker.
    let forward = tokio::spawn(forward_call(
        state.client.clone(),
        upstream,
        service.timeout(),
        breaker,
        service.name.clone(),
    ));

    match forward.await {
        Ok(Ok(response)) => {
            metrics::record_request(
                &ctx.method,
                response.status().as_u16(),
                &service.name,
                ctx.started,
            );
            response.into_response()
        }
        Ok(Err(error)) => {
            metrics::record_request(
                &ctx.method,
                error.status().as_u16(),
                &service.name,
                ctx.started,
            );
            normalize(&error, &ctx)
        }
        Err(join_error) => normalize(&GatewayError::Internal(join_error.to_string()), &ctx),
    }
}

/// First path segment after /api, the service routing key.
fn service_prefix(path: &str) -> Option<&str> {
    path.strip_prefix("/api/")?
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Rewrite the request URI toward the upstream, preserving path and query.
fn build_upstream_request(
    request: Request<Body>,
    address: &str,
) -> Result<Request<Body>, GatewayError> {
    let (mut parts, body) = request.into_parts();

    // The client derives Host from the rewritten authority.
    parts.headers.remove(header::HOST);

    let mut uri_parts = parts.uri.into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(
        Authority::from_str(address)
            .map_err(|e| GatewayError::Internal(format!("bad upstream address: {}", e)))?,
    );
    parts.uri = Uri::from_parts(uri_parts)
        .map_err(|e| GatewayError::Internal(format!("bad upstream uri: {}", e)))?;

    Ok(Request::from_parts(parts, body))
}

/// Place one call under the service's timeout and record its outcome.
///
/// Connect errors, timeouts and gateway-class upstream statuses (502/503/504)
/// count as breaker failures; everything else, including 4xx, is a success
/// from the breaker's point of view.
async fn forward_call(
    client: Client<HttpConnector, Body>,
    request: Request<Body>,
    timeout: Duration,
    breaker: Arc<CircuitBreaker>,
    service: String,
) -> Result<Response<Body>, GatewayError> {
    match tokio::time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            if matches!(response.status().as_u16(), 502 | 503 | 504) {
                breaker.record_failure();
            } else {
                breaker.record_success();
            }
            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        }
        Ok(Err(e)) => {
            breaker.record_failure();
            Err(GatewayError::DownstreamUnreachable {
                service,
                detail: e.to_string(),
            })
        }
        Err(_elapsed) => {
            breaker.record_failure();
            Err(GatewayError::DownstreamTimeout { service })
        }
    }
}
