//! Request signing for the Bybit V5 REST API
//!
//! This crate builds the authentication headers Bybit expects on private
//! endpoints. It performs no I/O: callers attach the returned headers to a
//! request they send themselves.
//!
//! # Signature
//!
//! ```text
//! X-BAPI-SIGN = hex(HMAC-SHA256(api_secret, timestamp + api_key + recv_window + payload))
//! ```
//!
//! `payload` is the query string for GET requests and the exact JSON body
//! for POST requests.
//!
//! # Example
//!
//! ```no_run
//! use bybit_auth::{build_get_headers, build_post_headers, canonical_query_string, Credentials};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load credentials from environment
//!     let creds = Credentials::from_env()?;
//!
//!     // GET: sign the exact query string that goes after `?`
//!     let query = canonical_query_string(&[("accountType", "UNIFIED")])?;
//!     let headers = build_get_headers(&creds, &query)?;
//!     for (name, value) in headers.iter() {
//!         println!("{}: {}", name, value);
//!     }
//!
//!     // POST: transmit `signed.body` verbatim
//!     let signed = build_post_headers(
//!         &creds,
//!         &serde_json::json!({"category": "spot", "symbol": "BTCUSDT"}),
//!     )?;
//!     println!("{} body bytes", signed.body.len());
//!
//!     Ok(())
//! }
//! ```

mod clock;
mod credentials;
mod error;
mod signer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credentials::{Credentials, DEFAULT_RECV_WINDOW_MS};
pub use error::{AuthError, AuthResult};
pub use signer::{
    build_get_headers, build_post_headers, canonical_query_string, to_canonical_json,
    RequestSigner, SignableRequest, SignedBody, SignedHeaders, CONTENT_TYPE_JSON,
    HEADER_API_KEY, HEADER_CONTENT_TYPE, HEADER_RECV_WINDOW, HEADER_SIGN, HEADER_SIGN_TYPE,
    HEADER_TIMESTAMP, SIGN_TYPE_HMAC_SHA256,
};
