//! Signed REST client for the Bybit V5 API
//!
//! This crate wires [`bybit_auth`] request signing to an HTTP transport.
//! Everything outside the signing core is injected: the transport, the clock
//! and the observability hooks.
//!
//! # Features
//!
//! - **Signed GET**: query string signed and sent byte-for-byte
//! - **Signed POST**: JSON body serialized once, signed, and sent verbatim
//! - **Typed errors**: transport failures, non-2xx statuses and `retCode` rejections
//! - **Hooks**: observe each request/response without global logging
//!
//! # Example
//!
//! ```no_run
//! use bybit_rest::{BybitRestClient, Credentials, ExchangeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BybitRestClient::with_config(ExchangeConfig::testnet())?
//!         .with_credentials(Credentials::from_env()?);
//!
//!     // Public endpoint (no auth required)
//!     let time = client.get_public("/v5/market/time", "").await?;
//!     println!("{}", time.text());
//!
//!     // Private POST
//!     let order = serde_json::json!({
//!         "category": "spot",
//!         "symbol": "BTCUSDT",
//!         "side": "Buy",
//!         "orderType": "Market",
//!         "qty": "0.001",
//!     });
//!     let placed = client.post("/v5/order/create", &order).await?;
//!     println!("{}", placed.text());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Rate Limiting
//!
//! The client does not throttle or retry. Use [`RestError::is_retryable`]
//! and [`RestError::is_rate_limited`] to drive your own policy.

pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod transport;

// Re-export main types
pub use client::BybitRestClient;
pub use config::{ExchangeConfig, MAINNET_URL, TESTNET_URL};
pub use error::{RestError, RestResult};
pub use hooks::Hooks;
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, TransportError,
};

// Re-export signing types
pub use bybit_auth::{canonical_query_string, Clock, Credentials, FixedClock, SystemClock};
