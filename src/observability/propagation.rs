//! Trace context propagation around forwarded calls.
//!
//! # Responsibilities
//! - Open one span per inbound request, named after its handler
//! - Parent that span on an inbound W3C `traceparent` when present
//! - Inject the span's context into outbound headers
//! - Mark the span as failed when forwarding fails
//!
//! Span lifetime is tied to the handler future: the span is entered by
//! `Instrument` and closes when that future completes or is dropped.

use axum::http::{HeaderMap, Method};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::sync::Arc;
use tracing::field::Empty;
use tracing::Span;
use tracing_opentelemetry::{OpenTelemetrySpanExt, SetParentError};

use crate::http::request::X_REQUEST_ID;

/// W3C trace-context propagation, held as an explicit dependency rather than
/// read from the OpenTelemetry global.
#[derive(Clone, Default)]
pub struct TracePropagator {
    inner: Arc<TraceContextPropagator>,
}

impl TracePropagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the span for one inbound request.
    pub fn handler_span(
        &self,
        handler: &'static str,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Span {
        let request_id = headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");

        let span = tracing::info_span!(
            "handler",
            otel.name = handler,
            otel.kind = "server",
            otel.status_code = Empty,
            otel.status_message = Empty,
            http.request.method = %method,
            url.path = path,
            http.response.status_code = Empty,
            request_id = request_id,
        );

        if let Err(e) = self.adopt_parent(&span, headers) {
            tracing::debug!(error = %e, "Span not parented on inbound trace context");
        }
        span
    }

    /// Parent `span` on the trace context carried by `headers`. Without a
    /// `traceparent` the span becomes a new trace root. Fails when no
    /// OpenTelemetry layer is installed or the span is disabled.
    pub fn adopt_parent(&self, span: &Span, headers: &HeaderMap) -> Result<(), SetParentError> {
        let parent = self.inner.extract(&HeaderExtractor(headers));
        span.set_parent(parent)
    }

    /// Write the span's context into outbound headers, replacing any
    /// trace headers the caller sent.
    pub fn inject(&self, span: &Span, headers: &mut HeaderMap) {
        let cx = span.context();
        self.inner.inject_context(&cx, &mut HeaderInjector(headers));
    }
}

/// Record the final status code on the span.
pub fn record_status(span: &Span, status: u16) {
    span.record("http.response.status_code", status);
}

/// Mark the span failed and attach the error as a span event.
pub fn record_failure(span: &Span, error: &dyn std::error::Error) {
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", error.to_string().as_str());
    span.in_scope(|| {
        tracing::error!(error = %error, "Upstream request failed");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_inject_without_active_trace_adds_nothing() {
        let propagator = TracePropagator::new();
        let span = Span::none();
        let mut headers = HeaderMap::new();
        propagator.inject(&span, &mut headers);
        assert!(headers.get("traceparent").is_none());
    }

    fn traceparent_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "traceparent",
            HeaderValue::from_static("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
        );
        headers
    }

    #[test]
    fn test_adopt_parent_reports_missing_otel_layer() {
        let propagator = TracePropagator::new();
        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("handler");
            let err = propagator
                .adopt_parent(&span, &traceparent_headers())
                .unwrap_err();
            assert!(matches!(err, SetParentError::LayerNotFound));
        });
    }

    #[test]
    fn test_adopt_parent_links_inbound_trace() {
        use opentelemetry::trace::{TraceContextExt, TraceId, TracerProvider as _};
        use tracing_subscriber::layer::SubscriberExt;

        let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder().build();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("propagation-test")));
        let propagator = TracePropagator::new();

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("handler");
            propagator
                .adopt_parent(&span, &traceparent_headers())
                .unwrap();
            let cx = span.context();
            assert_eq!(
                cx.span().span_context().trace_id(),
                TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
            );
        });
    }

    #[test]
    fn test_handler_span_tolerates_garbage_traceparent() {
        let propagator = TracePropagator::new();
        let mut headers = HeaderMap::new();
        headers.insert("traceparent", HeaderValue::from_static("not-a-trace"));
        let _span = propagator.handler_span("generate", &Method::POST, "/generate", &headers);
    }
}
