//! Security header stage.
//!
//! Outermost layer of the pipeline: a no-op on the way in, and the last
//! stage to touch the response, so the header set is present on every
//! response the gateway produces, success or error.

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::http::headers;

pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    headers::apply_security_headers(response.headers_mut(), &path);
    response
}
