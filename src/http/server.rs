//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, access tracing)
//! - Construct the forwarder and inject shared dependencies
//! - Serve until the shutdown signal fires

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, UpstreamConfig};
use crate::history::HistoryLog;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::TracePropagator;
use crate::upstream::Forwarder;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub history: HistoryLog,
    pub propagator: TracePropagator,
    pub upstream: Arc<UpstreamConfig>,
    pub body_log_sample_rate: f64,
}

impl AppState {
    pub fn new(config: &ProxyConfig, history: HistoryLog) -> Self {
        let propagator = TracePropagator::new();
        Self {
            forwarder: Forwarder::new(&config.upstream, propagator.clone()),
            history,
            propagator,
            upstream: Arc::new(config.upstream.clone()),
            body_log_sample_rate: config.observability.body_log_sample_rate,
        }
    }
}

/// HTTP server for the inference proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and history log.
    pub fn new(config: ProxyConfig, history: HistoryLog) -> Self {
        let state = AppState::new(&config, history);
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/generate", post(handlers::generate))
            .route("/ask", post(handlers::generate))
            .route("/pull", post(handlers::pull))
            .route("/history", get(handlers::history))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
