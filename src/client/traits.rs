//! The request pipeline seam shared by the HTTP client and its decorators.
//!
//! Every endpoint call is expressed as one [`ApiRequest`] → [`ApiResponse`]
//! round trip through [`QuoteApi::send`]. Typed operations (`quote`,
//! `program_id_to_label`) are provided methods built on top of `send`, so
//! a decorator only has to intercept `send` to see every call:
//!
//! ```ignore
//! // HttpQuoteClient performs the round trip over reqwest;
//! // CachingQuoteClient wraps any QuoteApi and intercepts `send`.
//! let client: Arc<dyn QuoteApi> = Arc::new(HttpQuoteClient::new()?);
//! let cached = CachingQuoteClient::new(client, CacheConfig::preset(CachePreset::Balanced))?;
//! let quote = cached.quote(&QuoteRequest::new(SOL, USDC, 1_000_000)).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::types::{QuoteRequest, QuoteResponse};
use crate::{Result, SwapQuoteError};

/// Path of the quote endpoint, relative to the API base URL.
pub const QUOTE_PATH: &str = "/quote";

/// Path of the program label endpoint.
pub const PROGRAM_LABELS_PATH: &str = "/program-id-to-label";

/// One outbound call: method, path and query pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    /// A `GET` request with no query parameters.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// The `GET /quote` request for `request`.
    pub fn quote(request: &QuoteRequest) -> Self {
        Self::get(QUOTE_PATH).with_query(request.to_query())
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Whether this is a read-only call to the quote endpoint.
    pub fn is_quote(&self) -> bool {
        self.method == Method::GET && self.path.trim_end_matches('/') == QUOTE_PATH
    }
}

/// The completed round trip: HTTP status and raw body.
///
/// Non-2xx statuses are still `Ok` at this layer; typed operations turn
/// them into [`SwapQuoteError::Api`] via [`error_for_status`](Self::error_for_status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response carrying `value` serialized as JSON.
    pub fn json_ok(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Map a non-2xx status to [`SwapQuoteError::Api`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = String::from_utf8_lossy(&self.body).trim().to_string();
        Err(SwapQuoteError::Api {
            status: self.status,
            message: if message.is_empty() {
                format!("HTTP {}", self.status)
            } else {
                message
            },
        })
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            return Err(SwapQuoteError::EmptyResponse);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Call surface of the quote service.
///
/// Implementors provide [`send`](Self::send); the typed operations are
/// derived from it. Decorators wrap an `Arc<dyn QuoteApi>` and implement
/// this trait again, so a wrapped client is a drop-in replacement.
#[async_trait]
pub trait QuoteApi: Send + Sync {
    /// Perform one round trip.
    ///
    /// Returns `Ok` for any HTTP status; `Err` only when the transport
    /// itself fails.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;

    /// Get a swap quote.
    async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse> {
        if request.input_mint.is_empty() || request.output_mint.is_empty() {
            return Err(SwapQuoteError::InvalidInput(
                "input and output mint are required".into(),
            ));
        }
        self.send(ApiRequest::quote(request))
            .await?
            .error_for_status()?
            .json()
    }

    /// Map of program ID to human-readable DEX label.
    async fn program_id_to_label(&self) -> Result<HashMap<String, String>> {
        self.send(ApiRequest::get(PROGRAM_LABELS_PATH))
            .await?
            .error_for_status()?
            .json()
    }
}
