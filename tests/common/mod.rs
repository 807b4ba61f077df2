//! Shared utilities for gateway integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use banking_gateway::config::{GatewayConfig, RateLimitConfig, ServiceConfig};
use banking_gateway::GatewayServer;

/// Read the request head (through the blank line) from a socket.
async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &str) {
    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a mock upstream that returns a fixed 200 response.
#[allow(dead_code)]
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_request_head(&mut socket).await;
                        write_response(&mut socket, 200, response).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a programmable mock upstream; the closure decides each response.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let _ = read_request_head(&mut socket).await;
                        let (status, body) = f().await;
                        write_response(&mut socket, status, &body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a mock upstream that forwards each request head it receives.
#[allow(dead_code)]
pub async fn start_inspecting_backend(addr: SocketAddr, heads: mpsc::UnboundedSender<String>) {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let heads = heads.clone();
                    tokio::spawn(async move {
                        let head = read_request_head(&mut socket).await;
                        let _ = heads.send(head);
                        write_response(&mut socket, 200, "ok").await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// A gateway config bound to localhost with one service, metrics disabled.
#[allow(dead_code)]
pub fn test_config(gateway_addr: SocketAddr, service: ServiceConfig) -> GatewayConfig {
    let mut config = GatewayConfig {
        services: vec![service],
        ..GatewayConfig::default()
    };
    config.listener.bind_address = gateway_addr.to_string();
    config.observability.metrics_enabled = false;
    config
}

/// A test service entry with fast breaker settings.
#[allow(dead_code)]
pub fn test_service(name: &str, prefix: &str, backend: SocketAddr) -> ServiceConfig {
    ServiceConfig {
        name: name.to_string(),
        path_prefix: prefix.to_string(),
        address: backend.to_string(),
        sliding_window_size: 10,
        minimum_calls: 5,
        failure_rate_threshold: 50.0,
        open_duration_secs: 1,
        half_open_trial_count: 3,
        timeout_secs: 1,
    }
}

/// Loose rate limits so unrelated tests never throttle.
#[allow(dead_code)]
pub fn unlimited_rate(config: &mut GatewayConfig) {
    config.rate_limit = RateLimitConfig {
        requests_per_minute: 100_000,
        requests_per_hour: 100_000,
        requests_per_day: 100_000,
        ..RateLimitConfig::default()
    };
}

/// Spawn the gateway and give it a moment to bind.
#[allow(dead_code)]
pub async fn start_gateway(config: GatewayConfig) -> SocketAddr {
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    addr
}

/// Non-pooled client so tests never share connections.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
