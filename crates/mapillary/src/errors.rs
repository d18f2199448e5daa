//! Error types for the Mapillary client
//!
//! Provides the error taxonomy for local validation failures, transport
//! failures, upstream API errors, and response decoding errors, along with
//! the classification the retry loop uses.

use std::time::Duration;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of client errors for retry classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Authentication errors (401, 403, bad/missing key) - never retried
    Authentication,
    /// Rate limiting (429) - retryable with backoff
    RateLimit,
    /// Upstream server errors (5xx) - retryable
    Server,
    /// Client-side errors (other 4xx, not found) - non-retryable
    Client,
    /// Network/connection/timeout errors - retryable
    Network,
    /// Local filter validation errors - non-retryable
    Validation,
    /// Response decoding errors - non-retryable
    Decode,
}

/// Errors surfaced by the Mapillary client
#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl Error {
    /// Shorthand for a local validation failure on a named filter input.
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimit(_) => ErrorCategory::RateLimit,
            Self::Api { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Api { .. } | Self::NotFound(_) => ErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ErrorCategory::Network,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Decode(_) => ErrorCategory::Decode,
        }
    }

    /// Whether a failed attempt with this error is safe to retry.
    ///
    /// Transient failures are timeouts, connection errors, 5xx responses and
    /// explicit rate-limit signals. Authentication failures and other 4xx
    /// responses are surfaced immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Server | ErrorCategory::Network
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_by_variant_and_status() {
        assert_eq!(
            Error::Authentication("bad key".into()).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(Error::RateLimit("slow down".into()).category(), ErrorCategory::RateLimit);
        assert_eq!(
            Error::Api { status: 503, message: "unavailable".into() }.category(),
            ErrorCategory::Server
        );
        assert_eq!(
            Error::Api { status: 400, message: "bad request".into() }.category(),
            ErrorCategory::Client
        );
        assert_eq!(Error::NotFound("no such image".into()).category(), ErrorCategory::Client);
        assert_eq!(
            Error::Timeout(Duration::from_secs(30)).category(),
            ErrorCategory::Network
        );
        assert_eq!(
            Error::Validation { field: "bbox", message: "west >= east".into() }.category(),
            ErrorCategory::Validation
        );
        assert_eq!(Error::Decode("missing id".into()).category(), ErrorCategory::Decode);
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(Error::RateLimit("throttled".into()).is_transient());
        assert!(Error::Api { status: 500, message: "boom".into() }.is_transient());
        assert!(Error::Network("connection reset".into()).is_transient());
        assert!(Error::Timeout(Duration::from_secs(5)).is_transient());
    }

    #[test]
    fn auth_and_client_errors_are_not_retryable() {
        assert!(!Error::Authentication("invalid key".into()).is_transient());
        assert!(!Error::Api { status: 403, message: "forbidden".into() }.is_transient());
        assert!(!Error::NotFound("gone".into()).is_transient());
        assert!(!Error::Validation { field: "radius", message: "negative".into() }.is_transient());
        assert!(!Error::Decode("bad json".into()).is_transient());
    }
}
