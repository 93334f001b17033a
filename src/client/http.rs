//! reqwest-backed transport for the quote service.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::traits::{ApiRequest, ApiResponse, QuoteApi};
use crate::Result;
use crate::telemetry;

/// Default base URL of the public quote API.
pub const DEFAULT_BASE_URL: &str = "https://quote-api.jup.ag/v6";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the optional API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Plain HTTP client for the quote service.
///
/// Performs every call over the network; wrap it in
/// [`CachingQuoteClient`](super::CachingQuoteClient) for response caching.
#[derive(Clone)]
pub struct HttpQuoteClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpQuoteClient {
    /// Client for the public endpoint with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client with a custom base URL (for self-hosted instances and wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Client with a custom base URL and request timeout.
    ///
    /// Fails with [`SwapQuoteError::Http`](crate::SwapQuoteError::Http) when
    /// the TLS backend cannot be initialised.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        })
    }

    /// Send `key` in the `x-api-key` header of every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn round_trip(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .query(&request.query);
        if let Some(ref key) = self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl QuoteApi for HttpQuoteClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let start = Instant::now();
        let result = self.round_trip(&request).await;
        let elapsed = start.elapsed();

        let status = match &result {
            Ok(response) if response.is_success() => "ok",
            _ => "error",
        };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "endpoint" => request.path.clone(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "endpoint" => request.path.clone(),
        )
        .record(elapsed.as_secs_f64());

        debug!(
            method = %request.method,
            path = %request.path,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "quote service round trip"
        );
        result
    }
}
