//! Pipeline stages, in their fixed execution order.
//!
//! # Stage Contract
//! Each stage receives the request (with the mutable [`RequestContext`]
//! extension) and either passes through to the next stage, short-circuits
//! with a normalized error response, or transforms headers in place.
//!
//! # Order (semantically significant)
//! ```text
//! request  → security.rs   (no-op inbound; holds the response exit)
//!          → cors          (tower-http layer; preflights answered here)
//!          → request_id.rs (correlation id, context creation)
//!          → logging.rs    (entry/exit log, exactly once per request)
//!          → auth.rs       (bearer validation; public prefixes skip)
//!          → throttle.rs   (per-client admission)
//!          → transform.rs  (gateway identity headers)
//!          → dispatch (proxy::dispatch, the only stage doing network I/O)
//! response ← security.rs   (security headers injected last, on every path)
//! ```
//!
//! [`RequestContext`]: crate::http::context::RequestContext

pub mod auth;
pub mod logging;
pub mod request_id;
pub mod security;
pub mod throttle;
pub mod transform;
