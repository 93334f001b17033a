//! Public types for the swap-quote API.

mod quote;

pub(crate) use quote::parse_amount;
pub use quote::{QuoteRequest, QuoteResponse, RoutePlanStep, SwapInfo, SwapMode};
