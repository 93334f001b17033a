//! Response-caching decorator for any [`QuoteApi`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use super::traits::{ApiRequest, ApiResponse, QuoteApi};
use crate::Result;
use crate::cache::{CacheConfig, CacheMetrics, Intercept, QuoteCache};

/// Decorator that wraps a [`QuoteApi`] with the quote cache.
///
/// `GET /quote` calls are answered from the cache when possible, and
/// concurrent identical quote calls share one outbound request. Every
/// other call is forwarded untouched. Errors from the wrapped client reach
/// the caller exactly as produced and are never cached.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use swapquote::{CachePreset, CachingQuoteClient, HttpQuoteClient, QuoteApi, QuoteRequest};
/// # async fn run() -> swapquote::Result<()> {
/// let client = CachingQuoteClient::new(
///     Arc::new(HttpQuoteClient::new()?),
///     CachePreset::Balanced.into(),
/// )?;
/// let quote = client
///     .quote(&QuoteRequest::new(
///         "So11111111111111111111111111111111111111112",
///         "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
///         1_000_000,
///     ))
///     .await?;
/// println!("{}", quote.out_amount);
/// # Ok(())
/// # }
/// ```
pub struct CachingQuoteClient {
    inner: Arc<dyn QuoteApi>,
    cache: QuoteCache,
}

impl CachingQuoteClient {
    /// Wrap `inner` with a new cache built from `config`.
    ///
    /// Fails with [`SwapQuoteError::Configuration`](crate::SwapQuoteError::Configuration)
    /// when advanced features are enabled and the config is inconsistent.
    pub fn new(inner: Arc<dyn QuoteApi>, config: CacheConfig) -> Result<Self> {
        Ok(Self::with_cache(inner, QuoteCache::new(config)?))
    }

    /// Wrap `inner` with an existing cache, possibly shared with other clients.
    pub fn with_cache(inner: Arc<dyn QuoteApi>, cache: QuoteCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    /// Empty the cache and reset its counters.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Tear down the cache. The client keeps working without caching.
    pub fn destroy(&self) {
        self.cache.destroy();
    }
}

impl fmt::Debug for CachingQuoteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingQuoteClient")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl QuoteApi for CachingQuoteClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        loop {
            match self.cache.pre(&request) {
                Intercept::Bypass => return self.inner.send(request).await,
                Intercept::Hit(response) => return Ok(response),
                Intercept::Join(pending) => {
                    let started = pending.started();
                    if let Some(result) = pending.wait().await {
                        self.cache.finish_join(&result, started.elapsed());
                        return result;
                    }
                    trace!(path = %request.path, "joined flight abandoned, looking up again");
                }
                Intercept::Miss(flight) => {
                    let result = self.inner.send(request).await;
                    self.cache.post(flight, &result);
                    return result;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::SwapQuoteError;
    use crate::types::QuoteRequest;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteApi for Counting {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ApiResponse::json_ok(&serde_json::json!({
                "inputMint": "A",
                "outputMint": "B",
                "inAmount": "1",
                "outAmount": n.to_string(),
            })))
        }
    }

    struct Failing;

    #[async_trait]
    impl QuoteApi for Failing {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse> {
            Err(SwapQuoteError::Http("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn repeated_quote_is_served_from_cache() {
        let inner = Arc::new(Counting::default());
        let client = CachingQuoteClient::new(inner.clone(), CacheConfig::default()).unwrap();
        let request = QuoteRequest::new("A", "B", 1);

        let first = client.send(ApiRequest::quote(&request)).await.unwrap();
        let second = client.send(ApiRequest::quote(&request)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.metrics().api_calls_saved, 1);
    }

    #[tokio::test]
    async fn transport_errors_pass_through_uncached() {
        let client = CachingQuoteClient::new(Arc::new(Failing), CacheConfig::default()).unwrap();
        let request = ApiRequest::quote(&QuoteRequest::new("A", "B", 1));

        let err = client.send(request.clone()).await.unwrap_err();
        assert_eq!(err, SwapQuoteError::Http("connection reset".into()));
        assert!(client.cache().is_empty());
        assert_eq!(client.metrics().misses, 1);
    }

    #[tokio::test]
    async fn destroyed_client_forwards_everything() {
        let inner = Arc::new(Counting::default());
        let client = CachingQuoteClient::new(inner.clone(), CacheConfig::default()).unwrap();
        client.destroy();
        let request = ApiRequest::quote(&QuoteRequest::new("A", "B", 1));
        client.send(request.clone()).await.unwrap();
        client.send(request).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.metrics(), CacheMetrics::default());
    }
}
