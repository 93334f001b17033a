//! swapquote - swap-quote API client with a response cache
//!
//! [`HttpQuoteClient`] talks to a DEX aggregator quote service.
//! [`CachingQuoteClient`] wraps any [`QuoteApi`] with a cache for
//! `GET /quote` that:
//!
//! - serves repeated quotes from a bounded LRU store with per-entry TTL;
//! - collapses concurrent identical quote calls into one outbound request;
//! - optionally shortens or stretches TTLs from observed price volatility
//!   (adaptive mode) and tracks hot quotes (predictive mode).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swapquote::{CachePreset, CachingQuoteClient, HttpQuoteClient, QuoteApi, QuoteRequest};
//!
//! #[tokio::main]
//! async fn main() -> swapquote::Result<()> {
//!     let client = CachingQuoteClient::new(
//!         Arc::new(HttpQuoteClient::new()?),
//!         CachePreset::Adaptive.into(),
//!     )?;
//!
//!     let request = QuoteRequest::new(
//!         "So11111111111111111111111111111111111111112",
//!         "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
//!         1_000_000_000,
//!     )
//!     .slippage_bps(50);
//!
//!     let quote = client.quote(&request).await?;
//!     println!("out: {}", quote.out_amount);
//!
//!     // served from cache
//!     client.quote(&request).await?;
//!     println!("hit ratio: {:.2}", client.metrics().hit_ratio());
//!
//!     client.destroy();
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
#[cfg(feature = "config")]
pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use cache::{CacheConfig, CacheMetrics, CachePreset, Fingerprint, QuoteCache};
pub use client::{ApiRequest, ApiResponse, CachingQuoteClient, HttpQuoteClient, QuoteApi};
pub use error::{Result, SwapQuoteError};
pub use types::{QuoteRequest, QuoteResponse, RoutePlanStep, SwapInfo, SwapMode};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
