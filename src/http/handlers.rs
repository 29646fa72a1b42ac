//! Route handlers.
//!
//! ```text
//! POST /generate ─ span ─ forward(/api/generate) ─ history append ─ stream body
//! POST /pull     ─ span ─ forward(/api/pull)     ─ status + headers (+ body)
//! GET  /history  ─ span ─ history range           ─ one line per entry
//! ```

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::Instrument;

use crate::http::response::{mirror, BodyMode};
use crate::http::server::AppState;
use crate::observability::{metrics, propagation};
use crate::upstream::ForwardRequest;

/// Which upstream operation a handler fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Generate,
    Pull,
}

impl Route {
    fn name(self) -> &'static str {
        match self {
            Route::Generate => "generate",
            Route::Pull => "pull",
        }
    }
}

pub async fn generate(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    request: Request<Body>,
) -> Response {
    proxy(state, Route::Generate, query, request).await
}

pub async fn pull(State(state): State<AppState>, request: Request<Body>) -> Response {
    proxy(state, Route::Pull, None, request).await
}

pub async fn history(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let span = state.propagator.handler_span(
        "history",
        request.method(),
        request.uri().path(),
        request.headers(),
    );

    async move {
        let entries = state.history.recent().await;
        let body: String = entries.iter().map(|entry| format!("{entry}\n")).collect();

        tracing::debug!(entries = entries.len(), "Serving request history");
        propagation::record_status(&tracing::Span::current(), 200);
        metrics::record_request("history", 200, start);

        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
    .instrument(span)
    .await
}

async fn proxy(
    state: AppState,
    route: Route,
    query: Option<String>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let span = state.propagator.handler_span(
        route.name(),
        &parts.method,
        parts.uri.path(),
        &parts.headers,
    );

    async move {
        let span = tracing::Span::current();
        let upstream_path = match route {
            Route::Generate => state.upstream.generate_path.as_str(),
            Route::Pull => state.upstream.pull_path.as_str(),
        };
        let forward = ForwardRequest {
            method: parts.method.clone(),
            path: upstream_path,
            headers: &parts.headers,
            body,
        };

        match state.forwarder.forward(forward, &span).await {
            Ok(upstream) => {
                let status = upstream.status().as_u16();

                if route == Route::Generate {
                    state.history.append(query.unwrap_or_default()).await;
                }

                let mode = match route {
                    Route::Generate => BodyMode::sampled(state.body_log_sample_rate),
                    Route::Pull if state.upstream.forward_pull_body => BodyMode::Stream,
                    Route::Pull => BodyMode::Discard,
                };

                tracing::info!(status, "Upstream response forwarded");
                propagation::record_status(&span, status);
                metrics::record_request(route.name(), status, start);
                mirror(upstream, mode)
            }
            Err(e) => {
                let status = e.status_code();
                propagation::record_failure(&span, &e);
                propagation::record_status(&span, status.as_u16());
                metrics::record_upstream_failure(route.name(), e.kind());
                metrics::record_request(route.name(), status.as_u16(), start);
                (status, e.public_message()).into_response()
            }
        }
    }
    .instrument(span)
    .await
}
