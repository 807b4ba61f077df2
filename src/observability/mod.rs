//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured log events (tracing, correlation id on every span)
//!     → counters/gauges/histograms (metrics.rs)
//!
//! Consumers:
//!     → log aggregation (stdout)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Structured logging with the request id flowing through every stage
//! - Metric updates are cheap (atomic increments); never block a response
//! - The exporter runs on its own listener, separate from client traffic

pub mod metrics;
