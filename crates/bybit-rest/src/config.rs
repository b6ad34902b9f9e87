//! Exchange connection configuration

use std::time::Duration;

use crate::error::{RestError, RestResult};

/// Bybit production REST endpoint
pub const MAINNET_URL: &str = "https://api.bybit.com";

/// Bybit testnet REST endpoint
pub const TESTNET_URL: &str = "https://api-testnet.bybit.com";

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent
const DEFAULT_USER_AGENT: &str = concat!("bybit-rest/", env!("CARGO_PKG_VERSION"));

/// Descriptor for one exchange connection
///
/// `rate_limit_ms` is informational; the client does not throttle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Short exchange identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Countries the exchange is registered in
    pub countries: Vec<String>,
    /// API version
    pub version: String,
    /// Exchange hostname
    pub hostname: String,
    /// Base URL every endpoint path is appended to
    pub base_endpoint: String,
    /// Minimum spacing between requests suggested by the exchange
    pub rate_limit_ms: u64,
    /// Request timeout
    pub timeout: Duration,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl ExchangeConfig {
    /// Production configuration
    pub fn mainnet() -> Self {
        Self {
            id: "bybit".to_string(),
            name: "Bybit".to_string(),
            countries: vec!["Japan".to_string()],
            version: "v5".to_string(),
            hostname: "bybit.com".to_string(),
            base_endpoint: MAINNET_URL.to_string(),
            rate_limit_ms: 20,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
        }
    }

    /// Testnet configuration
    pub fn testnet() -> Self {
        Self {
            base_endpoint: TESTNET_URL.to_string(),
            ..Self::mainnet()
        }
    }

    /// Create configuration from environment variables
    ///
    /// `BYBIT_TESTNET=1` (or `true`) selects the testnet, and `BYBIT_BASE_URL`
    /// overrides the base endpoint.
    pub fn from_env() -> RestResult<Self> {
        let testnet = std::env::var("BYBIT_TESTNET")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = if testnet { Self::testnet() } else { Self::mainnet() };

        match std::env::var("BYBIT_BASE_URL") {
            Ok(url) => config.with_base_endpoint(url),
            Err(_) => Ok(config),
        }
    }

    /// Override the base endpoint
    ///
    /// The URL must use http or https; a trailing slash is removed.
    pub fn with_base_endpoint(mut self, url: impl Into<String>) -> RestResult<Self> {
        let url = url.into();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(RestError::InvalidParameter(format!(
                "base endpoint must be an http(s) URL: {}",
                url
            )));
        }
        self.base_endpoint = url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Whether this configuration points at the testnet
    pub fn is_testnet(&self) -> bool {
        self.base_endpoint == TESTNET_URL
    }

    /// User agent to send
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}
