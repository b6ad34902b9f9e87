//! HTTP transport abstraction
//!
//! The client never talks to the network directly. It hands a fully built
//! [`HttpRequest`] to an injected [`HttpTransport`], which lets tests record
//! requests and script responses without real network calls.
//!
//! # Example
//!
//! ```no_run
//! use bybit_rest::transport::{
//!     HttpRequest, HttpTransport, Method, ReqwestTransport, TransportError,
//! };
//! use std::time::Duration;
//!
//! async fn example() -> Result<(), TransportError> {
//!     let transport = ReqwestTransport::new(Duration::from_secs(10), "my-bot/1.0")?;
//!     let request = HttpRequest::new(Method::Get, "https://api-testnet.bybit.com/v5/market/time");
//!     let response = transport.send(request).await?;
//!     println!("{}: {}", response.status, response.text());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use std::borrow::Cow;
#[cfg(any(test, feature = "test-utils"))]
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not build the underlying HTTP client
    #[error("client build failed: {0}")]
    ClientBuild(String),

    /// Request could not be sent
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Response body could not be read
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Request timed out
    #[error("request timeout after {0:?}")]
    Timeout(Duration),
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`, payload in the query string
    Get,
    /// `POST`, payload in the JSON body
    Post,
}

impl Method {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing request, fully built and ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including any query string
    pub url: String,
    /// Headers in insertion order
    pub headers: Vec<(String, String)>,
    /// Body bytes, transmitted verbatim
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a request with no headers and no body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Response as received from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Trait for HTTP transport abstraction
///
/// Implementations must be shareable between tasks. A failed send is
/// reported, never retried.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the full response
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Real HTTP transport using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new transport with a request timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::ReceiveFailed(e.to_string())
            }
        })?;

        debug!(status, len = body.len(), "HTTP response received");

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

/// Mock transport for testing
///
/// Returns scripted responses in order and records every request it is given.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: parking_lot::Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    sent: parking_lot::Mutex<Vec<HttpRequest>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTransport {
    /// Create a new mock transport with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Requests sent so far
    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().clone()
    }

    /// Take and clear the recorded requests
    pub fn take_sent(&self) -> Vec<HttpRequest> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::ConnectionFailed("no scripted response".into())))
    }
}
