//! Exchange client error types.

use thiserror::Error;

/// Errors from the Deribit client.
///
/// Nothing here is retried internally; every variant except `AuthRequired`
/// is retryable by the scheduler at the next tick.
#[derive(Debug, Error, Clone)]
pub enum DeribitError {
    /// Network failure, timeout, or undecodable response body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP response.
    #[error("HTTP error: {status}, body: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Exchange-reported logical error inside a 200 response.
    #[error("API error: {message} (code: {code})")]
    Api {
        /// Error message from the exchange.
        message: String,
        /// Error code from the exchange.
        code: i64,
    },

    /// The credential exchange itself failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A private call was attempted with no credential path configured.
    #[error("Authentication required: no credentials configured for private call")]
    AuthRequired,
}

impl DeribitError {
    /// Whether the scheduler may expect the next tick to succeed.
    ///
    /// `AuthRequired` is a configuration error and will not heal on retry.
    pub fn retryable(&self) -> bool {
        !matches!(self, Self::AuthRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_is_retryable() {
        assert!(DeribitError::Transport("connection refused".to_string()).retryable());
    }

    #[test]
    fn auth_required_is_not_retryable() {
        assert!(!DeribitError::AuthRequired.retryable());
    }

    #[test]
    fn api_error_display_includes_code() {
        let err = DeribitError::Api {
            message: "invalid currency".to_string(),
            code: 10004,
        };
        assert_eq!(err.to_string(), "API error: invalid currency (code: 10004)");
    }
}
