//! Inference proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                INFERENCE PROXY                │
//!   Client Request     │  ┌────────┐   ┌──────────┐   ┌────────────┐   │
//!   ───────────────────┼─▶│  http  │──▶│ handlers │──▶│  upstream  │───┼──▶ Model server
//!                      │  │ server │   │ + span   │   │ forwarder  │   │    /api/generate
//!   Client Response    │  └────────┘   └────┬─────┘   └────────────┘   │    /api/pull
//!   ◀──────────────────┼── streamed body    │                          │
//!                      │                    ▼                          │
//!                      │              ┌──────────┐                     │
//!                      │              │ history  │─────────────────────┼──▶ Redis list
//!                      │              └──────────┘                     │
//!                      │  ┌─────────────────────────────────────────┐  │
//!                      │  │ config · observability · lifecycle      │──┼──▶ OTLP collector
//!                      │  └─────────────────────────────────────────┘  │
//!                      └───────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use inference_proxy::config::{self, validate_config, ConfigError, ProxyConfig};
use inference_proxy::history::HistoryLog;
use inference_proxy::http::HttpServer;
use inference_proxy::lifecycle::Shutdown;
use inference_proxy::observability::{metrics, telemetry};

#[derive(Parser)]
#[command(name = "inference-proxy")]
#[command(about = "HTTP front door for a local model server", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `upstream.base_url`.
    #[arg(long)]
    upstream: Option<String>,
}

fn load(args: &Args) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(upstream) = &args.upstream {
        config.upstream.base_url = upstream.clone();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load(&args)?;

    let telemetry = telemetry::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        history_backend = ?config.history.backend,
        "inference-proxy starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let history = HistoryLog::from_config(&config.history)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signal_task = shutdown.trigger_on_signal();

    let server = HttpServer::new(config, history);
    let result = server.run(listener, shutdown.subscribe()).await;

    signal_task.abort();
    telemetry.shutdown();
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}
