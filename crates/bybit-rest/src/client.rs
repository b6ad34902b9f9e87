//! Main REST client implementation

use bybit_auth::{Clock, Credentials, RequestSigner, SignedHeaders, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::ExchangeConfig;
use crate::error::{RestError, RestResult};
use crate::hooks::Hooks;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};

/// Bybit REST API client
///
/// Signs private requests, hands them to the injected transport, and returns
/// the raw response. Non-2xx statuses and non-zero `retCode`s become errors;
/// nothing is retried.
///
/// # Example
///
/// ```no_run
/// use bybit_rest::{BybitRestClient, Credentials, ExchangeConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = BybitRestClient::with_config(ExchangeConfig::testnet())?
///         .with_credentials(Credentials::from_env()?);
///
///     let balance = client
///         .get("/v5/account/wallet-balance", "accountType=UNIFIED")
///         .await?;
///     println!("{}", balance.text());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct BybitRestClient {
    config: ExchangeConfig,
    transport: Arc<dyn HttpTransport>,
    credentials: Option<Credentials>,
    clock: Arc<dyn Clock>,
    hooks: Hooks,
}

impl BybitRestClient {
    /// Create a mainnet client without authentication
    ///
    /// Only public endpoints will be available.
    pub fn new() -> RestResult<Self> {
        Self::with_config(ExchangeConfig::default())
    }

    /// Create a client with custom configuration, backed by reqwest
    pub fn with_config(config: ExchangeConfig) -> RestResult<Self> {
        let transport = ReqwestTransport::new(config.timeout, config.user_agent())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client with an injected transport
    pub fn with_transport(config: ExchangeConfig, transport: Arc<dyn HttpTransport>) -> Self {
        info!(base = %config.base_endpoint, "Created Bybit REST client");

        Self {
            config,
            transport,
            credentials: None,
            clock: Arc::new(SystemClock),
            hooks: Hooks::default(),
        }
    }

    /// Set credentials for private endpoints
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replace the time source used for request timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set observability hooks
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Check if the client has credentials for private endpoints
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Get the exchange configuration
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Unsigned GET request
    ///
    /// # Arguments
    /// * `endpoint` - Path starting with `/` (e.g., "/v5/market/time")
    /// * `query` - Query string without the leading `?`, may be empty
    #[instrument(skip(self))]
    pub async fn get_public(&self, endpoint: &str, query: &str) -> RestResult<HttpResponse> {
        let request = HttpRequest::new(Method::Get, self.url(endpoint, query)?);
        self.execute(request).await
    }

    /// Signed GET request
    ///
    /// `query` is signed and appended to the URL byte-for-byte; build it with
    /// [`bybit_auth::canonical_query_string`] to get a stable ordering. A query
    /// that is not already URL-encoded is rejected with
    /// [`RestError::InvalidParameter`] before signing.
    #[instrument(skip(self))]
    pub async fn get(&self, endpoint: &str, query: &str) -> RestResult<HttpResponse> {
        let url = self.url(endpoint, query)?;
        let headers = self.signer()?.get_headers(query)?;

        let request = with_signed_headers(HttpRequest::new(Method::Get, url), &headers);
        self.execute(request).await
    }

    /// Signed POST request with a JSON body
    ///
    /// The body is serialized once; the signed bytes are the transmitted bytes.
    #[instrument(skip(self, body))]
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> RestResult<HttpResponse> {
        let url = self.url(endpoint, "")?;
        let (body, headers) = self.signer()?.post_headers(body)?.into_parts();

        let request =
            with_signed_headers(HttpRequest::new(Method::Post, url), &headers).with_body(body);
        self.execute(request).await
    }

    fn signer(&self) -> RestResult<RequestSigner<'_, dyn Clock>> {
        let creds = self.credentials.as_ref().ok_or(RestError::AuthRequired)?;
        Ok(RequestSigner::with_clock(creds, self.clock.as_ref()))
    }

    fn url(&self, endpoint: &str, query: &str) -> RestResult<String> {
        if !endpoint.starts_with('/') {
            return Err(RestError::InvalidParameter(format!(
                "endpoint must start with '/': {}",
                endpoint
            )));
        }
        if endpoint.contains('?') {
            return Err(RestError::InvalidParameter(format!(
                "endpoint must not carry a query string: {}",
                endpoint
            )));
        }

        let mut url = format!("{}{}", self.config.base_endpoint, endpoint);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }

        // The transport re-serializes the URL; it must come out byte-identical
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| RestError::InvalidParameter(format!("invalid URL {}: {}", url, e)))?;
        if !parsed.path().ends_with(endpoint) {
            return Err(RestError::InvalidParameter(format!(
                "endpoint must be URL-encoded: {}",
                endpoint
            )));
        }
        let wire_query = parsed.query().unwrap_or("");
        if wire_query != query {
            return Err(RestError::InvalidParameter(format!(
                "query must be URL-encoded (would be sent as {:?}): {}",
                wire_query, query
            )));
        }
        Ok(url)
    }

    async fn execute(&self, request: HttpRequest) -> RestResult<HttpResponse> {
        self.hooks.invoke_request(&request);
        debug!(method = %request.method, url = %request.url, "Sending request");

        let started = Instant::now();
        let response = match self.transport.send(request.clone()).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Transport failed");
                self.hooks.invoke_error(&e.to_string());
                return Err(e.into());
            }
        };
        let elapsed = started.elapsed();

        self.hooks.invoke_response(&request, &response, elapsed);
        debug!(
            status = response.status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Received response"
        );

        check_response(response).map_err(|e| {
            self.hooks.invoke_error(&e.to_string());
            e
        })
    }
}

impl std::fmt::Debug for BybitRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BybitRestClient")
            .field("base_endpoint", &self.config.base_endpoint)
            .field("has_credentials", &self.has_credentials())
            .finish()
    }
}

/// Bybit response envelope, read only to detect rejections
#[derive(Debug, Deserialize)]
struct RetEnvelope {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
}

fn check_response(response: HttpResponse) -> RestResult<HttpResponse> {
    if !response.is_success() {
        warn!(status = response.status, "Request failed");
        return Err(RestError::Status {
            status: response.status,
            body: response.text().into_owned(),
        });
    }

    if let Ok(envelope) = serde_json::from_slice::<RetEnvelope>(&response.body) {
        if envelope.ret_code != 0 {
            warn!(
                code = envelope.ret_code,
                message = %envelope.ret_msg,
                "Exchange rejected request"
            );
            return Err(RestError::Api {
                code: envelope.ret_code,
                message: envelope.ret_msg,
            });
        }
    }

    Ok(response)
}

fn with_signed_headers(mut request: HttpRequest, headers: &SignedHeaders) -> HttpRequest {
    for (name, value) in headers.iter() {
        request = request.with_header(name, value);
    }
    request
}
