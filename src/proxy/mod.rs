//! Downstream dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! /api/<prefix>/... → dispatch.rs
//!     → resolve service by first path segment
//!     → breaker try_acquire (open → 503, no attempt)
//!     → forward via pooled HTTP client under the service's timeout
//!     → record outcome into the breaker, even if the client went away
//! ```
//!
//! # Design Decisions
//! - The only stage permitted to block on network I/O
//! - No automatic retry on a client's behalf
//! - The forward runs in a spawned task so client disconnects never cancel
//!   breaker accounting

pub mod dispatch;

pub use dispatch::dispatch_handler;
