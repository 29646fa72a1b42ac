//! Outbound request construction and dispatch.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Response, Uri};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::Span;

use crate::config::UpstreamConfig;
use crate::observability::TracePropagator;
use crate::upstream::ForwardError;

/// Headers meaningful only for a single transport hop.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// One outbound call, assembled from an inbound request.
pub struct ForwardRequest<'a> {
    pub method: Method,
    /// Upstream path, e.g. `/api/generate`.
    pub path: &'a str,
    /// Inbound headers; cloned before any edit.
    pub headers: &'a HeaderMap,
    pub body: Body,
}

/// Issues requests to the configured model server.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    base_url: String,
    response_timeout: Duration,
    propagator: TracePropagator,
}

impl Forwarder {
    pub fn new(config: &UpstreamConfig, propagator: TracePropagator) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.connect_timeout()));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            response_timeout: config.response_timeout(),
            propagator,
        }
    }

    /// Forward `request` under `span`'s trace context.
    ///
    /// Returns once upstream response headers arrive; the body is left
    /// unread for the caller to stream.
    pub async fn forward(
        &self,
        request: ForwardRequest<'_>,
        span: &Span,
    ) -> Result<Response<Incoming>, ForwardError> {
        let outbound = self.build(request, span)?;
        let uri = outbound.uri().clone();

        tracing::debug!(uri = %uri, method = %outbound.method(), "Forwarding to upstream");

        match tokio::time::timeout(self.response_timeout, self.client.request(outbound)).await {
            Ok(Ok(response)) => {
                tracing::debug!(uri = %uri, status = %response.status(), "Upstream responded");
                Ok(response)
            }
            Ok(Err(e)) => Err(ForwardError::Network(e)),
            Err(_) => Err(ForwardError::Timeout(self.response_timeout)),
        }
    }

    fn build(&self, request: ForwardRequest<'_>, span: &Span) -> Result<Request<Body>, ForwardError> {
        let uri: Uri = format!("{}{}", self.base_url, request.path)
            .parse()
            .map_err(axum::http::Error::from)?;

        let mut headers = outbound_headers(request.headers);
        self.propagator.inject(span, &mut headers);

        let mut outbound = Request::builder()
            .method(request.method)
            .uri(uri)
            .body(request.body)?;
        *outbound.headers_mut() = headers;
        Ok(outbound)
    }
}

/// Shallow copy of the inbound headers fit for the next hop. `Host` is
/// dropped so the client derives it from the upstream URI.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    headers.remove(header::HOST);
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn config(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.to_string(),
            connect_timeout_secs: 1,
            response_timeout_secs: 1,
            ..UpstreamConfig::default()
        }
    }

    #[test]
    fn test_outbound_headers_leave_inbound_untouched() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("proxy:8080"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        inbound.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        inbound.append("x-model", HeaderValue::from_static("a"));
        inbound.append("x-model", HeaderValue::from_static("b"));
        let before = inbound.clone();

        let outbound = outbound_headers(&inbound);

        assert_eq!(inbound, before);
        assert!(outbound.get(header::HOST).is_none());
        assert!(outbound.get(header::CONNECTION).is_none());
        assert_eq!(outbound.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(outbound.get_all("x-model").iter().count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_target_is_construction_failure() {
        let forwarder = Forwarder::new(&config("http://bad host"), TracePropagator::new());
        let headers = HeaderMap::new();
        let err = forwarder
            .forward(
                ForwardRequest {
                    method: Method::POST,
                    path: "/api/generate",
                    headers: &headers,
                    body: Body::empty(),
                },
                &Span::none(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Construction(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = Forwarder::new(&config(&format!("http://{addr}")), TracePropagator::new());
        let headers = HeaderMap::new();
        let err = forwarder
            .forward(
                ForwardRequest {
                    method: Method::POST,
                    path: "/api/generate",
                    headers: &headers,
                    body: Body::from("{}"),
                },
                &Span::none(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Network(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept and never answer
        let _holder = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let forwarder = Forwarder::new(&config(&format!("http://{addr}")), TracePropagator::new());
        let headers = HeaderMap::new();
        let err = forwarder
            .forward(
                ForwardRequest {
                    method: Method::POST,
                    path: "/api/generate",
                    headers: &headers,
                    body: Body::empty(),
                },
                &Span::none(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Timeout(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
