//! Banking API Gateway Library

pub mod auth;
pub mod config;
pub mod http;
pub mod limit;
pub mod observability;
pub mod proxy;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::GatewayServer;
