//! Time sources for request timestamps
//!
//! Every signing operation reads the clock exactly once. The value is used for
//! both the signature input and the `X-BAPI-TIMESTAMP` header.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AuthError, AuthResult};

/// Source of the current time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    /// Read the current time
    ///
    /// Must not fall back to zero or a cached value on failure.
    fn now_millis(&self) -> AuthResult<u64>;
}

/// Wall clock backed by [`SystemTime`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> AuthResult<u64> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::ClockUnavailable(e.to_string()))?;

        u64::try_from(elapsed.as_millis())
            .map_err(|_| AuthError::ClockUnavailable("timestamp overflows u64".to_string()))
    }
}

/// Clock that always returns the same instant
///
/// Useful for reproducible signatures in tests and fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> AuthResult<u64> {
        Ok(self.0)
    }
}
