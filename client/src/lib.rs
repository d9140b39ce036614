//! HTTP client for the LedgerX transfer API.
//!
//! # Architecture
//!
//! - [`LedgerClient`] - one remote operation per method, success and failure normalized
//! - [`classify`] - maps failed responses and transport errors onto [`ApiErrorCode`]
//! - [`idempotency`] - per-call `Idempotency-Key` tokens for transfer submission
//! - [`health`] - the [`HealthProbe`] seam consumed by the readiness coordinator
//!
//! # Endpoints
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | `GET` | `/api/v1/accounts/{accountNumber}` | [`Account`] |
//! | `GET` | `/api/v1/transactions?page=&size=` | [`Page<Transaction>`] |
//! | `POST` | `/api/v1/transfers` | [`Transaction`] |
//! | `POST` | `/api/v1/demo/reset` | nothing |
//! | `GET` | health path (default `/api/v1/health`) | [`HealthStatus`] |
//!
//! # Error Handling
//!
//! Every method returns `Result<_, ApiError>`. Nothing is retried here; retries
//! are either user-initiated or, for health probes, owned by the caller.

pub mod classify;
pub mod health;
pub mod idempotency;

use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

pub use health::{HealthProbe, HealthStatus, ProbeFut};
pub use idempotency::{IDEMPOTENCY_KEY_HEADER, IdempotencyKey};
pub use ledgerx_types::{
    Account, AccountNumber, ApiError, ApiErrorCode, Page, ResponseBody, Transaction,
    TransferRequest,
};

/// Default health endpoint path.
pub const DEFAULT_HEALTH_PATH: &str = "/api/v1/health";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 100;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("base URL '{0}' cannot carry a path")]
    UnusableBaseUrl(String),
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Connection settings for [`LedgerClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: Url,
    pub health_path: String,
    pub connect_timeout: Duration,
}

impl ClientOptions {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

fn base_client_builder(connect_timeout: Duration) -> reqwest::ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    default_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

/// Client for the LedgerX API. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: Url,
    health_path: String,
}

impl LedgerClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientBuildError> {
        if options.base_url.cannot_be_a_base() {
            return Err(ClientBuildError::UnusableBaseUrl(
                options.base_url.to_string(),
            ));
        }
        let http = base_client_builder(options.connect_timeout).build()?;
        Ok(Self {
            http,
            base_url: options.base_url,
            health_path: options.health_path,
        })
    }

    /// Client with default options for `base_url`.
    pub fn from_base_url(base_url: &str) -> Result<Self, ClientBuildError> {
        Self::new(ClientOptions::new(Url::parse(base_url)?))
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /api/v1/accounts/{accountNumber}`.
    pub async fn get_account(&self, account_number: &AccountNumber) -> Result<Account, ApiError> {
        let url = self.endpoint(&["api", "v1", "accounts", account_number.as_str()]);
        let builder = self.http.get(url);
        self.execute_json(builder, "get_account").await
    }

    /// `GET /api/v1/transactions`. `size` is clamped to at least 1.
    pub async fn list_transactions(
        &self,
        page: u32,
        size: u32,
    ) -> Result<Page<Transaction>, ApiError> {
        let mut url = self.endpoint(&["api", "v1", "transactions"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.max(1).to_string());
        let builder = self.http.get(url);
        self.execute_json(builder, "list_transactions").await
    }

    /// `POST /api/v1/transfers` with a freshly minted idempotency key.
    pub async fn submit_transfer(&self, request: &TransferRequest) -> Result<Transaction, ApiError> {
        let key = IdempotencyKey::generate();
        tracing::debug!(
            idempotency_key = %key,
            from = %request.from_account(),
            to = %request.to_account(),
            amount = request.amount().value(),
            "Submitting transfer"
        );
        let url = self.endpoint(&["api", "v1", "transfers"]);
        let builder = key.apply(self.http.post(url).json(request));
        self.execute_json(builder, "submit_transfer").await
    }

    /// `POST /api/v1/demo/reset`.
    pub async fn reset_demo_state(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "v1", "demo", "reset"]);
        let builder = self.http.post(url);
        self.execute(builder, "reset_demo_state").await.map(|_| ())
    }

    /// One health check bounded by `timeout`.
    pub async fn probe_health(&self, timeout: Duration) -> Result<HealthStatus, ApiError> {
        let segments: Vec<&str> = self
            .health_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        let url = self.endpoint(&segments);
        let builder = self.http.get(url).timeout(timeout);
        self.execute_json(builder, "probe_health").await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let (status, body) = self.execute(builder, operation).await?;
        decode_body(status, body)
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<(StatusCode, ResponseBody), ApiError> {
        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            tracing::debug!(operation, error = %e, "Request failed before a response arrived");
            classify::transport_error(&e)
        })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let limit = if status.is_success() {
            MAX_BODY_BYTES
        } else {
            MAX_ERROR_BODY_BYTES
        };
        let raw = read_capped_body(response, limit)
            .await
            .map_err(|e| classify::transport_error(&e))?;
        let body = parse_body(raw, is_json);

        tracing::debug!(
            operation,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "LedgerX API call finished"
        );

        if !status.is_success() {
            return Err(classify::classify_status(status.as_u16(), body));
        }
        Ok((status, body))
    }
}

/// Read a response body, truncating once `limit` bytes have been received.
pub async fn read_capped_body(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, reqwest::Error> {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk?);
        if body.len() > limit {
            body.truncate(limit);
            let text = String::from_utf8_lossy(&body);
            return Ok(format!("{text}...(truncated)"));
        }
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Interpret raw body text. JSON is parsed only when the server said so;
/// unparseable or non-JSON bodies are kept as text.
#[must_use]
pub fn parse_body(raw: String, is_json: bool) -> ResponseBody {
    if raw.is_empty() {
        return ResponseBody::Empty;
    }
    if is_json && let Ok(value) = serde_json::from_str(&raw) {
        return ResponseBody::Json(value);
    }
    ResponseBody::Text(raw)
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, body: ResponseBody) -> Result<T, ApiError> {
    let decoded = match &body {
        ResponseBody::Json(value) => T::deserialize(value).map_err(|e| e.to_string()),
        ResponseBody::Text(text) => serde_json::from_str(text).map_err(|e| e.to_string()),
        ResponseBody::Empty => serde_json::from_str("null").map_err(|e| e.to_string()),
    };
    decoded.map_err(|reason| {
        tracing::warn!(status = status.as_u16(), %reason, "Unexpected LedgerX API payload");
        ApiError::new(
            ApiErrorCode::HttpError,
            Some(status.as_u16()),
            format!("Unexpected response from LedgerX API: {reason}"),
            body,
        )
    })
}
