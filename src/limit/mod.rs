//! Rate limiting subsystem.
//!
//! # Data Flow
//! ```text
//! Request (post-auth):
//!     client key = "user:<id>" | "ip:<addr>"
//!     → throttle.rs (atomic reset/check/increment, three windows)
//!     → admitted | throttled (429 + Retry-After)
//!
//! Background:
//!     sweeper task → evict keys idle for a full day window
//! ```
//!
//! # Design Decisions
//! - Fixed windows, not sliding: up to ~2x the ceiling across a boundary is
//!   accepted behavior for this gateway
//! - One DashMap entry lock per key; unrelated keys never serialize
//! - The key table is a cache with eviction, not an unbounded map

pub mod throttle;

pub use throttle::RateLimiter;
