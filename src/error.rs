//! swapquote error types

/// swapquote error types
///
/// `Clone` so that every caller attached to a de-duplicated request
/// observes the same failure as the caller that issued it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwapQuoteError {
    // Transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("empty response from quote service")]
    EmptyResponse,

    // Configuration errors
    /// Raised only while constructing a cache with advanced features enabled.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for SwapQuoteError {
    fn from(err: serde_json::Error) -> Self {
        SwapQuoteError::Json(err.to_string())
    }
}

/// Transport failures. Errors carrying a status map to `Api`; everything else
/// (connect, timeout, body read, client build) maps to `Http`.
impl From<reqwest::Error> for SwapQuoteError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SwapQuoteError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => SwapQuoteError::Http(err.to_string()),
        }
    }
}

/// Result type alias for swapquote operations
pub type Result<T> = std::result::Result<T, SwapQuoteError>;
