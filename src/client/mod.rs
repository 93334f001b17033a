//! Quote service clients.
//!
//! [`HttpQuoteClient`] talks to the service over HTTP.
//! [`CachingQuoteClient`] wraps any [`QuoteApi`] with the quote cache.

mod caching;
mod http;
mod traits;

pub use caching::CachingQuoteClient;
pub use http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpQuoteClient};
pub use traits::{ApiRequest, ApiResponse, PROGRAM_LABELS_PATH, QUOTE_PATH, QuoteApi};
