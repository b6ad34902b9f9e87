//! Signed header construction for Bybit V5 REST requests
//!
//! GET and POST requests share one signing primitive, [`RequestSigner::sign`].
//! The only difference between them is where the payload comes from:
//!
//! - GET: the canonical query string appended to the URL
//! - POST: the exact JSON bytes transmitted as the body
//!
//! Whatever bytes are signed must be the bytes that go on the wire.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::credentials::Credentials;
use crate::error::AuthResult;

/// Header carrying the API key
pub const HEADER_API_KEY: &str = "X-BAPI-API-KEY";
/// Header carrying the hex signature
pub const HEADER_SIGN: &str = "X-BAPI-SIGN";
/// Header carrying the millisecond timestamp used in the signature
pub const HEADER_TIMESTAMP: &str = "X-BAPI-TIMESTAMP";
/// Header selecting the signature algorithm
pub const HEADER_SIGN_TYPE: &str = "X-BAPI-SIGN-TYPE";
/// Header carrying the receive window
pub const HEADER_RECV_WINDOW: &str = "X-BAPI-RECV-WINDOW";
/// Content type header
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// `X-BAPI-SIGN-TYPE` value for HMAC-SHA256
pub const SIGN_TYPE_HMAC_SHA256: &str = "2";
/// Content type sent with every signed request
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Payload of a request to be signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableRequest {
    /// Already-ordered `key=value&key=value` string appended to the URL
    Query(String),
    /// Serialized JSON body, transmitted verbatim
    Body(Vec<u8>),
}

impl SignableRequest {
    /// Wrap a canonical query string
    pub fn query(query: impl Into<String>) -> Self {
        Self::Query(query.into())
    }

    /// Serialize a body to canonical JSON
    pub fn json<T: Serialize + ?Sized>(body: &T) -> AuthResult<Self> {
        Ok(Self::Body(to_canonical_json(body)?))
    }

    /// Bytes appended to the signing input
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Query(query) => query.as_bytes(),
            Self::Body(body) => body,
        }
    }

    /// Take ownership of the payload bytes
    pub fn into_payload(self) -> Vec<u8> {
        match self {
            Self::Query(query) => query.into_bytes(),
            Self::Body(body) => body,
        }
    }
}

/// Authentication headers for exactly one request
///
/// Tied to the timestamp and payload it was computed from. Build a new set
/// for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    timestamp: u64,
    entries: Vec<(&'static str, String)>,
}

impl SignedHeaders {
    fn new(credentials: &Credentials, signature: String, timestamp: u64) -> Self {
        let entries = vec![
            (HEADER_API_KEY, credentials.api_key().to_string()),
            (HEADER_SIGN, signature),
            (HEADER_TIMESTAMP, timestamp.to_string()),
            (HEADER_SIGN_TYPE, SIGN_TYPE_HMAC_SHA256.to_string()),
            (HEADER_RECV_WINDOW, credentials.recv_window_ms().to_string()),
            (HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON.to_string()),
        ];

        Self { timestamp, entries }
    }

    /// Look up a header value (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The hex signature
    pub fn signature(&self) -> &str {
        self.get(HEADER_SIGN).unwrap_or_default()
    }

    /// The timestamp the signature was computed at
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Iterate over `(name, value)` pairs in a stable order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(key, value)| (*key, value.as_str()))
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the header set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialized body together with the headers signed over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBody {
    /// Exact bytes to transmit
    pub body: Vec<u8>,
    /// Headers whose signature covers `body`
    pub headers: SignedHeaders,
}

impl SignedBody {
    /// Split into body bytes and headers
    pub fn into_parts(self) -> (Vec<u8>, SignedHeaders) {
        (self.body, self.headers)
    }
}

/// Request signer bound to one account and one time source
pub struct RequestSigner<'a, C: Clock + ?Sized = SystemClock> {
    credentials: &'a Credentials,
    clock: &'a C,
}

impl<'a> RequestSigner<'a, SystemClock> {
    /// Create a signer that reads the system wall clock
    pub fn new(credentials: &'a Credentials) -> Self {
        Self {
            credentials,
            clock: &SystemClock,
        }
    }
}

impl<'a, C: Clock + ?Sized> RequestSigner<'a, C> {
    /// Create a signer with an injected clock
    pub fn with_clock(credentials: &'a Credentials, clock: &'a C) -> Self {
        Self { credentials, clock }
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// Sign a request payload
    ///
    /// Reads the clock once; that timestamp feeds both the signature and the
    /// `X-BAPI-TIMESTAMP` header.
    pub fn sign(&self, request: &SignableRequest) -> AuthResult<SignedHeaders> {
        let timestamp = self.clock.now_millis()?;
        let payload = request.payload();
        let signature = self.credentials.sign(timestamp, payload)?;

        trace!(timestamp, payload_len = payload.len(), "Signed request");

        Ok(SignedHeaders::new(self.credentials, signature, timestamp))
    }

    /// Build headers for a GET request
    ///
    /// `query` must be exactly what follows `?` in the URL.
    pub fn get_headers(&self, query: &str) -> AuthResult<SignedHeaders> {
        self.sign(&SignableRequest::query(query))
    }

    /// Serialize a POST body once and build headers over those bytes
    pub fn post_headers<T: Serialize + ?Sized>(&self, body: &T) -> AuthResult<SignedBody> {
        let request = SignableRequest::json(body)?;
        let headers = self.sign(&request)?;

        Ok(SignedBody {
            body: request.into_payload(),
            headers,
        })
    }
}

impl<C: Clock + ?Sized> std::fmt::Debug for RequestSigner<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("credentials", self.credentials)
            .finish_non_exhaustive()
    }
}

/// Build signed headers for a GET request using the system clock
pub fn build_get_headers(credentials: &Credentials, query: &str) -> AuthResult<SignedHeaders> {
    RequestSigner::new(credentials).get_headers(query)
}

/// Serialize a POST body and build signed headers using the system clock
pub fn build_post_headers<T: Serialize + ?Sized>(
    credentials: &Credentials,
    body: &T,
) -> AuthResult<SignedBody> {
    RequestSigner::new(credentials).post_headers(body)
}

/// Encode query parameters as `key=value&key=value`, preserving their order
///
/// Accepts anything `serde_urlencoded` can serialize: slices of tuples,
/// ordered maps, or flat structs.
pub fn canonical_query_string<T: Serialize + ?Sized>(params: &T) -> AuthResult<String> {
    Ok(serde_urlencoded::to_string(params)?)
}

/// Serialize a value to compact JSON with object keys sorted at every level
///
/// Hash maps serialize identically regardless of iteration order.
pub fn to_canonical_json<T: Serialize + ?Sized>(body: &T) -> AuthResult<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(body)?);
    Ok(serde_json::to_vec(&value)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(key, value)| (key, sort_keys(value))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::AuthError;
    use std::collections::HashMap;

    const TS: u64 = 1_700_000_000_000;

    fn creds() -> Credentials {
        Credentials::with_recv_window("k1", "s1", 5000).unwrap()
    }

    #[derive(Serialize)]
    struct OrderBody<'a> {
        category: &'a str,
        symbol: &'a str,
        side: &'a str,
        qty: &'a str,
    }

    fn order() -> OrderBody<'static> {
        OrderBody {
            category: "spot",
            symbol: "BTCUSDT",
            side: "Buy",
            qty: "0.01",
        }
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot serialize"))
        }
    }

    #[test]
    fn test_get_headers_fixture() {
        let creds = creds();
        let clock = FixedClock(TS);
        let headers = RequestSigner::with_clock(&creds, &clock)
            .get_headers("symbol=BTCUSDT")
            .unwrap();

        assert_eq!(
            headers.signature(),
            "bf9acb5cf3673c6012d886add116e1c0274f21143d8542b6607557b1816ad076"
        );
        assert_eq!(headers.get(HEADER_API_KEY), Some("k1"));
        assert_eq!(headers.get(HEADER_TIMESTAMP), Some("1700000000000"));
        assert_eq!(headers.get(HEADER_SIGN_TYPE), Some("2"));
        assert_eq!(headers.get(HEADER_RECV_WINDOW), Some("5000"));
        assert_eq!(headers.get(HEADER_CONTENT_TYPE), Some("application/json"));
        assert_eq!(headers.timestamp(), TS);
        assert_eq!(headers.len(), 6);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let creds = creds();
        let clock = FixedClock(TS);
        let headers = RequestSigner::with_clock(&creds, &clock).get_headers("").unwrap();
        assert_eq!(headers.get("x-bapi-sign-type"), Some("2"));
        assert_eq!(headers.get("X-Unknown"), None);
    }

    #[test]
    fn test_empty_query_signs_prefix_only() {
        let creds = creds();
        let clock = FixedClock(TS);
        let headers = RequestSigner::with_clock(&creds, &clock).get_headers("").unwrap();
        assert_eq!(
            headers.signature(),
            "52548bd0ca91aec15b9b1ad2edb53e8c4f4de36393e1e4f9dd1a2904d92be6e3"
        );
    }

    #[test]
    fn test_post_headers_fixture() {
        let creds = creds();
        let clock = FixedClock(TS);
        let signed = RequestSigner::with_clock(&creds, &clock)
            .post_headers(&order())
            .unwrap();

        assert_eq!(
            signed.body,
            br#"{"category":"spot","qty":"0.01","side":"Buy","symbol":"BTCUSDT"}"#.to_vec()
        );
        assert_eq!(
            signed.headers.signature(),
            "eea6380bc0fab9eda305ea5546b0b15f77784a08a3b0eda8d19920de5c037db3"
        );
    }

    #[test]
    fn test_post_signature_covers_transmitted_bytes() {
        let creds = creds();
        let clock = FixedClock(TS);
        let (body, headers) = RequestSigner::with_clock(&creds, &clock)
            .post_headers(&order())
            .unwrap()
            .into_parts();

        assert_eq!(headers.signature(), creds.sign(TS, &body).unwrap());
    }

    #[test]
    fn test_get_and_post_share_primitive() {
        let creds = creds();
        let clock = FixedClock(TS);
        let signer = RequestSigner::with_clock(&creds, &clock);

        let via_get = signer.get_headers("a=1").unwrap();
        let via_enum = signer.sign(&SignableRequest::Body(b"a=1".to_vec())).unwrap();
        assert_eq!(via_get, via_enum);
    }

    #[test]
    fn test_deterministic_with_fixed_clock() {
        let creds = creds();
        let clock = FixedClock(TS);
        let signer = RequestSigner::with_clock(&creds, &clock);

        let first = signer.get_headers("symbol=ETHUSDT&limit=5").unwrap();
        let second = signer.get_headers("symbol=ETHUSDT&limit=5").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_each_field_changes_signature() {
        let base_creds = creds();
        let base = RequestSigner::with_clock(&base_creds, &FixedClock(TS))
            .get_headers("symbol=BTCUSDT")
            .unwrap();

        let later = RequestSigner::with_clock(&base_creds, &FixedClock(TS + 1))
            .get_headers("symbol=BTCUSDT")
            .unwrap();
        assert_ne!(base.signature(), later.signature());

        let other_key = Credentials::with_recv_window("k2", "s1", 5000).unwrap();
        let keyed = RequestSigner::with_clock(&other_key, &FixedClock(TS))
            .get_headers("symbol=BTCUSDT")
            .unwrap();
        assert_ne!(base.signature(), keyed.signature());

        let other_window = Credentials::with_recv_window("k1", "s1", 5001).unwrap();
        let windowed = RequestSigner::with_clock(&other_window, &FixedClock(TS))
            .get_headers("symbol=BTCUSDT")
            .unwrap();
        assert_ne!(base.signature(), windowed.signature());
        assert_eq!(windowed.get(HEADER_RECV_WINDOW), Some("5001"));

        let other_payload = RequestSigner::with_clock(&base_creds, &FixedClock(TS))
            .get_headers("symbol=BTCUSDC")
            .unwrap();
        assert_ne!(base.signature(), other_payload.signature());
    }

    #[test]
    fn test_canonical_json_is_order_independent() {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        let keys: Vec<String> = (0..32).map(|i| format!("field{:02}", i)).collect();

        for (i, key) in keys.iter().enumerate() {
            forward.insert(key.clone(), i);
        }
        for (i, key) in keys.iter().enumerate().rev() {
            backward.insert(key.clone(), i);
        }

        let a = to_canonical_json(&forward).unwrap();
        let b = to_canonical_json(&backward).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(br#"{"field00":0,"field01":1"#));
    }

    #[test]
    fn test_canonical_json_sorts_nested_objects() {
        let body = serde_json::json!({
            "b": {"z": 1, "a": [{"y": true, "x": null}]},
            "a": "first",
        });
        let bytes = to_canonical_json(&body).unwrap();
        assert_eq!(bytes, br#"{"a":"first","b":{"a":[{"x":null,"y":true}],"z":1}}"#.to_vec());
    }

    #[test]
    fn test_repeated_serialization_is_identical() {
        let first = to_canonical_json(&order()).unwrap();
        for _ in 0..10 {
            assert_eq!(to_canonical_json(&order()).unwrap(), first);
        }
    }

    #[test]
    fn test_serialization_error_aborts_signing() {
        let creds = creds();
        let clock = FixedClock(TS);
        let result = RequestSigner::with_clock(&creds, &clock).post_headers(&Unserializable);
        assert!(matches!(result, Err(AuthError::Serialization(_))));
    }

    #[test]
    fn test_clock_failure_aborts_signing() {
        struct BrokenClock;
        impl Clock for BrokenClock {
            fn now_millis(&self) -> AuthResult<u64> {
                Err(AuthError::ClockUnavailable("no time source".to_string()))
            }
        }

        let creds = creds();
        let result = RequestSigner::with_clock(&creds, &BrokenClock).get_headers("a=1");
        assert!(matches!(result, Err(AuthError::ClockUnavailable(_))));
    }

    #[test]
    fn test_canonical_query_preserves_order() {
        let query = canonical_query_string(&[
            ("category", "linear"),
            ("symbol", "BTCUSDT"),
            ("orderLinkId", "a b&c"),
        ])
        .unwrap();
        assert_eq!(query, "category=linear&symbol=BTCUSDT&orderLinkId=a+b%26c");
    }

    #[test]
    fn test_system_clock_signer_round_trips() {
        let creds = creds();
        let headers = build_get_headers(&creds, "symbol=BTCUSDT").unwrap();
        let timestamp: u64 = headers.get(HEADER_TIMESTAMP).unwrap().parse().unwrap();

        assert_eq!(timestamp, headers.timestamp());
        assert_eq!(
            headers.signature(),
            creds.sign(timestamp, b"symbol=BTCUSDT").unwrap()
        );
    }

    #[test]
    fn test_concurrent_signing_is_isolated() {
        let creds = creds();

        let results: Vec<(String, SignedHeaders)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..32)
                .map(|i| {
                    let creds = &creds;
                    scope.spawn(move || {
                        let query = format!("symbol=COIN{}USDT&limit={}", i, i);
                        let headers = build_get_headers(creds, &query).unwrap();
                        (query, headers)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (query, headers) in &results {
            let expected = creds.sign(headers.timestamp(), query.as_bytes()).unwrap();
            assert_eq!(headers.signature(), expected);
        }
    }
}
