//! Subscriber and span export setup.
//!
//! Installs one `tracing` subscriber with a filtered fmt layer and, when an
//! OTLP endpoint is configured, a `tracing-opentelemetry` layer feeding a
//! batching tracer provider. The returned guard owns the provider and must be
//! shut down on exit to flush pending spans.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::Layer;

use crate::config::ObservabilityConfig;
use crate::observability::logging;

/// Instrumentation scope name for spans created by this crate.
pub const TRACER_NAME: &str = "inference-proxy";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("failed to install subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Keeps the tracer provider alive for the life of the process.
#[must_use]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Flush and stop span export. Export failures are reported, not fatal.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Tracer provider shutdown failed");
            }
        }
    }
}

/// Build the batching OTLP tracer provider, or `None` when export is off.
///
/// The gRPC channel connects lazily, so an unreachable collector only shows
/// up as export errors in the log.
pub fn tracer_provider(
    config: &ObservabilityConfig,
) -> Result<Option<SdkTracerProvider>, TelemetryError> {
    let Some(endpoint) = &config.otlp_endpoint else {
        return Ok(None);
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()?;

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .build();

    Ok(Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    ))
}

/// Install the global subscriber. Call once, from inside the Tokio runtime.
pub fn init(config: &ObservabilityConfig) -> Result<TelemetryGuard, TelemetryError> {
    let provider = tracer_provider(config)?;

    // Spans are exported regardless of log verbosity; only this crate's
    // spans go out so exporter internals never trace themselves.
    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer()
            .with_tracer(p.tracer(TRACER_NAME))
            .with_filter(Targets::new().with_target("inference_proxy", Level::INFO))
    });

    tracing_subscriber::registry()
        .with(logging::fmt_layer(config).with_filter(logging::env_filter(config)))
        .with(otel_layer)
        .try_init()?;

    tracing::info!(
        otlp_endpoint = ?config.otlp_endpoint,
        service_name = %config.service_name,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { provider })
}
