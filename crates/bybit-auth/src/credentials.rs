//! API credentials for Bybit's private endpoints
//!
//! Implements the V5 HMAC-SHA256 signature:
//! `hex(HMAC-SHA256(api_secret, timestamp + api_key + recv_window + payload))`
//!
//! # Security
//!
//! The API secret is stored using the `secrecy` crate which:
//! - Zeroizes memory on drop
//! - Prevents accidental logging via Debug impl
//! - Provides explicit access via `expose_secret()`

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Default receive window in milliseconds
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

/// API credentials for one Bybit account
///
/// Immutable once constructed. Share it by reference between tasks; signing
/// never mutates it.
pub struct Credentials {
    /// API key (sent in plaintext as the account identity)
    api_key: String,
    /// API secret (HMAC key, zeroized on drop)
    api_secret: SecretString,
    /// Tolerance the exchange allows between our timestamp and its clock
    recv_window_ms: u64,
}

impl Credentials {
    /// Create new credentials with the default 5000 ms receive window
    ///
    /// # Arguments
    /// * `api_key` - Your Bybit API key
    /// * `api_secret` - Your Bybit API secret (plain text, not base64)
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> AuthResult<Self> {
        Self::with_recv_window(api_key, api_secret, DEFAULT_RECV_WINDOW_MS)
    }

    /// Create new credentials with an explicit receive window
    pub fn with_recv_window(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        recv_window_ms: u64,
    ) -> AuthResult<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.is_empty() {
            return Err(AuthError::InvalidCredentials("API key is empty".to_string()));
        }
        if api_secret.is_empty() {
            return Err(AuthError::InvalidCredentials("API secret is empty".to_string()));
        }
        if recv_window_ms == 0 {
            return Err(AuthError::InvalidCredentials(
                "receive window must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            api_secret: SecretString::from(api_secret),
            recv_window_ms,
        })
    }

    /// Create credentials from environment variables
    ///
    /// Reads `BYBIT_API_KEY` and `BYBIT_API_SECRET`, and optionally
    /// `BYBIT_RECV_WINDOW` (milliseconds).
    pub fn from_env() -> AuthResult<Self> {
        let api_key = std::env::var("BYBIT_API_KEY")
            .map_err(|_| AuthError::EnvVarNotSet("BYBIT_API_KEY".to_string()))?;
        let api_secret = std::env::var("BYBIT_API_SECRET")
            .map_err(|_| AuthError::EnvVarNotSet("BYBIT_API_SECRET".to_string()))?;

        let recv_window_ms = match std::env::var("BYBIT_RECV_WINDOW") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                AuthError::InvalidCredentials(format!("Invalid BYBIT_RECV_WINDOW: {}", raw))
            })?,
            Err(_) => DEFAULT_RECV_WINDOW_MS,
        };

        Self::with_recv_window(api_key, api_secret, recv_window_ms)
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the receive window in milliseconds
    pub fn recv_window_ms(&self) -> u64 {
        self.recv_window_ms
    }

    /// Sign a payload at the given timestamp
    ///
    /// Bybit V5 signature algorithm:
    /// 1. message = timestamp + api_key + recv_window + payload
    /// 2. HMAC-SHA256(api_secret, message)
    /// 3. Lowercase hex encode result
    ///
    /// # Arguments
    /// * `timestamp` - Milliseconds since the Unix epoch, also sent as `X-BAPI-TIMESTAMP`
    /// * `payload` - Query string (GET) or exact body bytes (POST)
    pub fn sign(&self, timestamp: u64, payload: &[u8]) -> AuthResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.expose_secret().as_bytes())
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
        mac.update(self.signing_prefix(timestamp).as_bytes());
        mac.update(payload);

        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Everything in the signing input that precedes the payload
    pub(crate) fn signing_prefix(&self, timestamp: u64) -> String {
        format!("{}{}{}", timestamp, self.api_key, self.recv_window_ms)
    }
}

impl Clone for Credentials {
    /// Clone credentials (creates new SecretString with same content)
    fn clone(&self) -> Self {
        Self {
            api_key: self.api_key.clone(),
            api_secret: SecretString::from(self.api_secret.expose_secret().to_string()),
            recv_window_ms: self.recv_window_ms,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let visible = self
            .api_key
            .char_indices()
            .nth(8)
            .map_or(self.api_key.as_str(), |(idx, _)| &self.api_key[..idx]);

        f.debug_struct("Credentials")
            .field("api_key", &format!("{}...", visible))
            .field("api_secret", &"[REDACTED]")
            .field("recv_window_ms", &self.recv_window_ms)
            .finish()
    }
}
