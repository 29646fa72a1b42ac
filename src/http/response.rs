//! Upstream response mirroring.
//!
//! # Design Decisions
//! - Status and headers are copied verbatim
//! - Bodies are streamed, never buffered whole
//! - Sampled body logging taps chunks as they pass through
//! - A discarded body also drops its framing headers so the caller is not
//!   promised bytes that never come

use axum::body::Body;
use axum::http::{header, Response};
use futures_util::StreamExt;
use hyper::body::Incoming;
use rand::Rng;

/// What to do with the upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Stream through untouched.
    Stream,
    /// Stream through, logging each chunk at debug level.
    StreamLogged,
    /// Send status and headers only.
    Discard,
}

impl BodyMode {
    /// `StreamLogged` for a `rate` fraction of calls, `Stream` otherwise.
    pub fn sampled(rate: f64) -> Self {
        if rate > 0.0 && rand::thread_rng().gen_bool(rate.min(1.0)) {
            BodyMode::StreamLogged
        } else {
            BodyMode::Stream
        }
    }
}

/// Turn an upstream response into the caller's response.
pub fn mirror(upstream: Response<Incoming>, mode: BodyMode) -> Response<Body> {
    let (mut parts, body) = upstream.into_parts();

    let body = match mode {
        BodyMode::Stream => Body::new(body),
        BodyMode::StreamLogged => {
            let status = parts.status;
            let chunks = Body::new(body).into_data_stream().inspect(move |chunk| match chunk {
                Ok(bytes) => tracing::debug!(
                    status = %status,
                    len = bytes.len(),
                    chunk = %String::from_utf8_lossy(bytes),
                    "Upstream body chunk"
                ),
                Err(e) => tracing::warn!(error = %e, "Upstream body stream failed"),
            });
            Body::from_stream(chunks)
        }
        BodyMode::Discard => {
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.remove(header::TRANSFER_ENCODING);
            Body::empty()
        }
    };

    Response::from_parts(parts, body)
}
