//! Resilience subsystem: per-service failure isolation.
//!
//! # Data Flow
//! ```text
//! Dispatch to a downstream service:
//!     → registry.rs (look up the service's breaker)
//!     → circuit_breaker.rs try_acquire (fail fast when open)
//!     → per-call timeout enforced by the dispatcher
//!     → record outcome (success | failure) back into the breaker
//! ```
//!
//! # Design Decisions
//! - One independently configured breaker per downstream service
//! - Fail fast in Open state, no waiting for the downstream timeout
//! - Bounded probe count in Half-Open prevents hammering a recovering service
//! - The gateway never retries on a client's behalf; recovery is governed by
//!   the breaker timer alone

pub mod circuit_breaker;
pub mod registry;

pub use circuit_breaker::{BreakerMode, BreakerSettings, CircuitBreaker};
pub use registry::CircuitBreakerRegistry;
