//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use inference_proxy::config::{HistoryBackend, ProxyConfig};
use inference_proxy::history::{HistoryLog, MemoryHistoryStore};
use inference_proxy::http::HttpServer;
use inference_proxy::lifecycle::Shutdown;

/// A request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    pub captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

/// Start a model-server stand-in that answers every request with a fixed
/// status, headers and body, recording what it received.
pub async fn start_mock_upstream(
    status: u16,
    headers: &'static [(&'static str, &'static str)],
    body: &'static str,
) -> MockUpstream {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let sink = sink.clone();
        async move {
            let (parts, req_body) = request.into_parts();
            let req_body = axum::body::to_bytes(req_body, usize::MAX).await.unwrap();
            sink.lock().unwrap().push(Captured {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                headers: parts.headers,
                body: req_body,
            });

            let mut response = Response::new(Body::from(body));
            *response.status_mut() = StatusCode::from_u16(status).unwrap();
            for (name, value) in headers {
                response.headers_mut().insert(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                );
            }
            response
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, captured }
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Proxy configuration pointed at `upstream`, with in-memory history and
/// span export off.
pub fn proxy_config(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = format!("http://{}", upstream);
    config.upstream.connect_timeout_secs = 1;
    config.upstream.response_timeout_secs = 5;
    config.history.backend = HistoryBackend::Memory;
    config.observability.otlp_endpoint = None;
    config
}

pub struct RunningProxy {
    pub addr: SocketAddr,
    pub history: HistoryLog,
    pub shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `config` on an ephemeral port with in-memory history.
pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let history = HistoryLog::new(Arc::new(MemoryHistoryStore::new()), config.history.capacity);
    start_proxy_with_history(config, history).await
}

/// Serve `config` on an ephemeral port over the given history log.
pub async fn start_proxy_with_history(config: ProxyConfig, history: HistoryLog) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, history.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningProxy {
        addr,
        history,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
