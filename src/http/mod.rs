//! HTTP subsystem: server, pipeline stages, error shaping.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → middleware/ (fixed-order stage list, see middleware/mod.rs)
//!     → proxy::dispatch (breaker + timeout guarded forward)
//!     → response transforms and security headers on the way out
//!
//! Any stage failure
//!     → error.rs (uniform envelope, one shape regardless of origin)
//! ```

pub mod context;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod server;

pub use context::{ClientIdentity, RequestContext};
pub use error::GatewayError;
pub use server::{AppState, GatewayServer};
