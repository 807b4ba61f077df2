//! Banking API Gateway
//!
//! Single ingress for the banking backend, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │                 API GATEWAY                     │
//!                      │                                                 │
//!   Client Request     │  ┌───────────┐   ┌──────────┐   ┌───────────┐  │
//!   ───────────────────┼─▶│ request   │──▶│  auth    │──▶│ throttle  │  │
//!                      │  │ id        │   │ (bearer) │   │ (windows) │  │
//!                      │  └───────────┘   └──────────┘   └─────┬─────┘  │
//!                      │                                       │        │
//!                      │                                       ▼        │
//!                      │  ┌───────────┐   ┌──────────┐   ┌───────────┐  │
//!   Client Response    │  │ security  │◀──│ error    │◀──│ dispatch  │◀─┼── user/account/
//!   ◀──────────────────┼──│ headers   │   │ envelope │   │ + breaker │  │   transaction/
//!                      │  └───────────┘   └──────────┘   └───────────┘  │   payment/
//!                      │                                                 │   notification
//!                      │  Cross-cutting: config, observability,          │   services
//!                      │  circuit breakers, per-service timeouts         │
//!                      └────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;

// Request policies
pub mod auth;
pub mod limit;
pub mod resilience;

// Cross-cutting concerns
pub mod observability;

use std::path::Path;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::loader::load_config;
use crate::config::GatewayConfig;
use crate::http::GatewayServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banking_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("banking-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    // First CLI argument is an optional config file path.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => GatewayConfig::with_default_services(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        requests_per_minute = config.rate_limit.requests_per_minute,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            crate::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let server = GatewayServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
