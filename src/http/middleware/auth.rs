//! Authentication stage.
//!
//! Public-route prefixes skip authentication entirely. Every other route
//! requires `Authorization: Bearer <token>`; a missing or invalid token
//! short-circuits with 401 before any downstream dispatch. On success the
//! identity claims are written into normalized headers for downstream
//! consumption and the raw token is stripped, never forwarded.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthError;
use crate::http::context::{ClientIdentity, RequestContext};
use crate::http::error::{normalize, GatewayError};
use crate::http::headers;
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let mut ctx = RequestContext::of(&request);

    if is_public_route(&state, &ctx.path) {
        return next.run(request).await;
    }

    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => {
            metrics::record_auth_rejected("missing");
            return normalize(&GatewayError::Unauthenticated(AuthError::Malformed), &ctx);
        }
    };

    let claims = match state.codec.validate(&token) {
        Ok(claims) => claims,
        Err(e) => {
            metrics::record_auth_rejected(match e {
                AuthError::Expired => "expired",
                AuthError::BadSignature => "bad_signature",
                AuthError::Malformed => "malformed",
            });
            return normalize(&GatewayError::Unauthenticated(e), &ctx);
        }
    };

    // Identity headers replace the credential downstream.
    request.headers_mut().remove(header::AUTHORIZATION);
    set_header(&mut request, headers::USER_ID, &claims.sub);
    set_header(&mut request, headers::USER_ROLE, &claims.role);
    set_header(&mut request, headers::USER_EMAIL, &claims.email);

    ctx.identity = Some(ClientIdentity {
        user_id: claims.sub,
        role: claims.role,
        email: claims.email,
    });
    request.extensions_mut().insert(ctx);

    next.run(request).await
}

fn is_public_route(state: &AppState, path: &str) -> bool {
    state
        .config
        .auth
        .public_route_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

fn set_header(request: &mut Request<Body>, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        request.headers_mut().insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request), Some("abc.def.ghi"));

        let no_scheme = Request::builder()
            .header(header::AUTHORIZATION, "abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&no_scheme), None);

        let empty = Request::builder()
            .header(header::AUTHORIZATION, "Bearer ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&empty), None);

        let absent = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&absent), None);
    }
}
