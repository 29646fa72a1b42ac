//! Forwarding failures and their HTTP mapping.

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwardError {
    /// The outbound request could not be assembled. Nothing was sent.
    #[error("failed to build upstream request: {0}")]
    Construction(#[from] axum::http::Error),

    /// The upstream could not be reached or broke off below HTTP.
    #[error("upstream call failed: {0}")]
    Network(#[from] hyper_util::client::legacy::Error),

    /// The upstream produced no response headers within the deadline.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// Status returned to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardError::Construction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ForwardError::Network(_) | ForwardError::Timeout(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Body text returned to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            ForwardError::Construction(_) => "Failed to create request to upstream",
            ForwardError::Network(_) | ForwardError::Timeout(_) => "Upstream call failed",
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Construction(_) => "construction",
            ForwardError::Network(_) => "network",
            ForwardError::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let construction: ForwardError = "http://bad host/"
            .parse::<axum::http::Uri>()
            .map_err(axum::http::Error::from)
            .unwrap_err()
            .into();
        assert_eq!(construction.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(construction.kind(), "construction");

        let timeout = ForwardError::Timeout(Duration::from_secs(1));
        assert_eq!(timeout.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(timeout.public_message(), "Upstream call failed");
    }
}
