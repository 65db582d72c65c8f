use std::time::Duration;

use thiserror::Error;

/// Failure of a single call against an upstream recipe provider
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Provider answered 429 Too Many Requests
    #[error("Upstream rate limited (HTTP {status})")]
    RateLimited { status: u16 },

    /// Provider answered with a 5xx status
    #[error("Upstream server error (HTTP {status})")]
    ServerError { status: u16 },

    /// Provider answered with any other non-2xx status
    #[error("Upstream rejected request (HTTP {status})")]
    Rejected { status: u16 },

    /// The call did not complete within the client timeout
    #[error("Upstream request timed out")]
    Timeout,

    /// Connection, TLS or body transfer failure
    #[error("Upstream request failed: {0}")]
    Network(#[source] reqwest::Error),
}

impl UpstreamError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => UpstreamError::RateLimited { status },
            500..=599 => UpstreamError::ServerError { status },
            _ => UpstreamError::Rejected { status },
        }
    }

    /// HTTP status carried by the error, if the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::RateLimited { status }
            | UpstreamError::ServerError { status }
            | UpstreamError::Rejected { status } => Some(*status),
            UpstreamError::Timeout | UpstreamError::Network(_) => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, UpstreamError::RateLimited { .. })
    }
}

// Providers classify non-2xx statuses themselves and never call
// `error_for_status`, so a client error here is always a transport failure
impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Network(err)
        }
    }
}

/// Errors that can occur while configuring or running the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Every attempt allowed by the strategy plan failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The request did not finish within its deadline
    #[error("Request exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A provider base URL did not parse
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Socket bind or serve failure
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(UpstreamError::from_status(429).is_rate_limited());
        assert!(matches!(
            UpstreamError::from_status(503),
            UpstreamError::ServerError { status: 503 }
        ));
        assert!(matches!(
            UpstreamError::from_status(402),
            UpstreamError::Rejected { status: 402 }
        ));
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(UpstreamError::from_status(500).status(), Some(500));
        assert_eq!(UpstreamError::Timeout.status(), None);
    }

    #[test]
    fn test_upstream_message_is_transparent() {
        let err = GatewayError::from(UpstreamError::from_status(500));
        assert_eq!(err.to_string(), "Upstream server error (HTTP 500)");
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_network_error() {
        let err = reqwest::get("http://127.0.0.1:1/").await.unwrap_err();
        let upstream = UpstreamError::from(err);

        assert!(matches!(upstream, UpstreamError::Network(_)));
        assert_eq!(upstream.status(), None);
        assert!(!upstream.is_rate_limited());
    }
}
