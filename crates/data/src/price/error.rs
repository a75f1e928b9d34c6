use thiserror::Error;

/// Errors from fetching price data.
#[derive(Error, Debug)]
pub enum PriceError {
    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout: {0}")]
    Timeout(String),

    /// Provider asked us to back off.
    #[error("rate limited by provider (HTTP 429)")]
    RateLimit,

    /// Non-success HTTP status.
    #[error("provider error {status_code}: {message}")]
    Api { status_code: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("failed to parse provider response: {0}")]
    Parse(String),

    /// No provider serves this market.
    #[error("unsupported market for symbol '{0}'")]
    UnsupportedMarket(String),
}

impl PriceError {
    /// Returns true if the request may succeed when repeated.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            Self::Parse(_) | Self::UnsupportedMarket(_) => false,
        }
    }
}

impl From<reqwest::Error> for PriceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Api {
                status_code: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PriceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
