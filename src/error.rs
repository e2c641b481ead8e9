//! Proxy error types
//!
//! Distinguishes client-input errors (rejected before any outbound fetch)
//! from upstream/runtime errors, and maps each to its HTTP status code.

use hyper::StatusCode;
use thiserror::Error;

/// Errors produced while handling one proxy invocation.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `url` query parameter is missing or empty after trimming.
    #[error("Missing url parameter. Example: ?url=https://example.com")]
    MissingUrl,

    /// The `url` value does not parse as an absolute URL.
    #[error("Invalid URL")]
    InvalidUrl,

    /// The URL parsed but its scheme is not http or https.
    #[error("Unsupported protocol")]
    UnsupportedProtocol,

    /// The outbound fetch or body read failed.
    #[error(transparent)]
    Upstream(#[from] reqwest::Error),
}

impl ProxyError {
    /// Whether this error was caused by the caller's input.
    ///
    /// Client errors short-circuit before the outbound fetch and are not
    /// retryable without correcting the input.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUrl | Self::InvalidUrl | Self::UnsupportedProtocol
        )
    }

    /// HTTP status code this error maps to.
    pub const fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_messages() {
        assert_eq!(
            ProxyError::MissingUrl.to_string(),
            "Missing url parameter. Example: ?url=https://example.com"
        );
        assert_eq!(ProxyError::InvalidUrl.to_string(), "Invalid URL");
        assert_eq!(
            ProxyError::UnsupportedProtocol.to_string(),
            "Unsupported protocol"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::InvalidUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::UnsupportedProtocol.status(),
            StatusCode::BAD_REQUEST
        );
        assert!(ProxyError::MissingUrl.is_client_error());
    }
}
