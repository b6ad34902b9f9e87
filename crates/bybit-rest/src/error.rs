//! Error types for REST API operations

use bybit_auth::AuthError;

use crate::transport::TransportError;

/// `retCode` returned when the request timestamp is outside the receive window
pub const RET_CODE_RECV_WINDOW: i64 = 10002;
/// `retCode` returned for an unknown API key
pub const RET_CODE_INVALID_API_KEY: i64 = 10003;
/// `retCode` returned when the signature does not match
pub const RET_CODE_SIGN_ERROR: i64 = 10004;
/// `retCode` returned when the account is rate limited
pub const RET_CODE_RATE_LIMITED: i64 = 10006;

/// Errors that can occur during REST API operations
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Request could not be signed; nothing was sent
    #[error("Signing failed: {0}")]
    Auth(#[from] AuthError),

    /// Transport failed before a response was received
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Missing API credentials for private endpoint
    #[error("Authentication required for this endpoint")]
    AuthRequired,

    /// Non-2xx HTTP status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (lossy UTF-8)
        body: String,
    },

    /// Exchange returned a non-zero `retCode`
    #[error("API error {code}: {message}")]
    Api {
        /// Bybit `retCode`
        code: i64,
        /// Bybit `retMsg`
        message: String,
    },

    /// Invalid request parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl RestError {
    /// Check if this error is retryable
    ///
    /// Only classifies; the client never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Api { code, .. } => {
                *code == RET_CODE_RATE_LIMITED || *code == RET_CODE_RECV_WINDOW
            }
            Self::Auth(_) | Self::AuthRequired | Self::InvalidParameter(_) => false,
        }
    }

    /// Check if this error indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
            || matches!(self, Self::Api { code, .. } if *code == RET_CODE_RATE_LIMITED)
    }

    /// Check if the exchange rejected the request's authentication
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
            || matches!(
                self,
                Self::Api { code, .. } if matches!(
                    *code,
                    RET_CODE_RECV_WINDOW | RET_CODE_INVALID_API_KEY | RET_CODE_SIGN_ERROR
                )
            )
    }
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limit_classification() {
        let err = RestError::Api {
            code: RET_CODE_RATE_LIMITED,
            message: "Too many visits!".to_string(),
        };
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());

        let err = RestError::Status {
            status: 429,
            body: String::new(),
        };
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_auth_rejection_classification() {
        let err = RestError::Api {
            code: RET_CODE_SIGN_ERROR,
            message: "error sign!".to_string(),
        };
        assert!(err.is_auth_rejected());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_recovery_classes() {
        let timeout = TransportError::Timeout(Duration::from_secs(1));
        assert!(RestError::Transport(timeout).is_retryable());
        assert!(!RestError::AuthRequired.is_retryable());
        assert!(!RestError::Auth(AuthError::ClockUnavailable("x".into())).is_retryable());
        assert!(RestError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(!RestError::Status { status: 400, body: String::new() }.is_retryable());
    }
}
