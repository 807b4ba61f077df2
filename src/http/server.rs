//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the fixed-order pipeline stages
//! - Cross-origin policy for browser clients (preflights short-circuit here)
//! - Wire shared state (token codec, rate limiter, breaker registry, client)
//! - Serve the operational endpoints (/actuator/*)
//! - Bind the server and run with graceful shutdown
//! - Background sweeping of idle throttle entries

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::{any, get},
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenCodec;
use crate::config::GatewayConfig;
use crate::http::context::RequestContext;
use crate::http::error::{normalize, GatewayError};
use crate::http::headers;
use crate::http::middleware::{
    auth::auth_middleware, logging::logging_middleware, request_id::request_id_middleware,
    security::security_headers_middleware, throttle::throttle_middleware,
    transform::transform_middleware,
};
use crate::limit::RateLimiter;
use crate::proxy::dispatch_handler;
use crate::resilience::CircuitBreakerRegistry;

/// Shared state injected into every stage and handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub codec: TokenCodec,
    pub limiter: Arc<RateLimiter>,
    pub breakers: CircuitBreakerRegistry,
    pub client: Client<HttpConnector, Body>,
    pub started_at: Instant,
}

/// The gateway's HTTP server.
pub struct GatewayServer {
    router: Router,
    state: AppState,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            codec: TokenCodec::new(&config.auth.jwt_secret),
            limiter: Arc::new(RateLimiter::new(config.rate_limit.clone())),
            breakers: CircuitBreakerRegistry::from_services(&config.services),
            config: Arc::new(config),
            client,
            started_at: Instant::now(),
        };

        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the router with the statically ordered stage list.
    ///
    /// ServiceBuilder applies layers top-down on the request path, so the
    /// first listed stage is outermost and touches the response last.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/api/{*path}", any(dispatch_handler))
            .route("/actuator/health", get(health_handler))
            .route("/actuator/info", get(info_handler))
            .route("/actuator/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/info", get(info_handler))
            .fallback(fallback_handler)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(from_fn(security_headers_middleware))
                    .layer(cors_layer())
                    .layer(from_fn(request_id_middleware))
                    .layer(from_fn(logging_middleware))
                    .layer(from_fn_with_state(state.clone(), auth_middleware))
                    .layer(from_fn_with_state(state.clone(), throttle_middleware))
                    .layer(from_fn(transform_middleware)),
            )
            .with_state(state)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway starting");

        // Sweep idle throttle entries in the background.
        let limiter = self.state.limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.sweep_interval());
            interval.tick().await;
            loop {
                interval.tick().await;
                limiter.evict_idle();
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }
}

/// Cross-origin policy for browser clients.
///
/// The allow-origin value mirrors the request origin because credentialed
/// requests cannot use a wildcard. Preflights are answered here, before
/// authentication or admission run, and stay valid for an hour.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static(headers::USER_ID),
            HeaderName::from_static(headers::USER_ROLE),
            HeaderName::from_static(headers::USER_EMAIL),
            HeaderName::from_static(headers::REQUEST_ID),
            HeaderName::from_static(headers::REQUEST_TIMESTAMP),
        ])
        .expose_headers([
            HeaderName::from_static(headers::REQUEST_ID),
            HeaderName::from_static(headers::REQUEST_TIMESTAMP),
            header::RETRY_AFTER,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let breakers: Value = state
        .breakers
        .snapshot()
        .into_iter()
        .map(|(name, mode)| (name, Value::from(mode.as_str())))
        .collect::<serde_json::Map<_, _>>()
        .into();

    Json(json!({
        "status": "UP",
        "service": headers::GATEWAY_ID,
        "timestamp": headers::timestamp_now(),
        "circuitBreakers": breakers,
    }))
}

async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    let services: Vec<&str> = state
        .config
        .services
        .iter()
        .map(|s| s.name.as_str())
        .collect();

    Json(json!({
        "service": headers::GATEWAY_ID,
        "version": headers::GATEWAY_VERSION,
        "services": services,
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> Json<Value> {
    let breakers: Value = state
        .breakers
        .snapshot()
        .into_iter()
        .map(|(name, mode)| (name, Value::from(mode.as_str())))
        .collect::<serde_json::Map<_, _>>()
        .into();

    Json(json!({
        "uptimeSecs": state.started_at.elapsed().as_secs(),
        "throttleKeys": state.limiter.tracked_clients(),
        "circuitBreakers": breakers,
        "prometheus": state.config.observability.metrics_address,
    }))
}

/// Unmatched routes get the same envelope as every other failure.
async fn fallback_handler(request: Request<Body>) -> Response {
    let ctx = RequestContext::of(&request);
    normalize(&GatewayError::UnknownRoute, &ctx)
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
