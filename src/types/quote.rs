//! Quote request and response types

use serde::{Deserialize, Serialize};

/// Whether `amount` fixes the input or the output side of a swap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapMode {
    #[default]
    ExactIn,
    ExactOut,
}

impl SwapMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactIn => "ExactIn",
            Self::ExactOut => "ExactOut",
        }
    }
}

/// Parameters for `GET /quote`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Raw amount in the smallest unit of the fixed side.
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage_bps: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_mode: Option<SwapMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_direct_routes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict_intermediate_tokens: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_accounts: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dexes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_dexes: Vec<String>,
}

impl QuoteRequest {
    pub fn new(input_mint: impl Into<String>, output_mint: impl Into<String>, amount: u64) -> Self {
        Self {
            input_mint: input_mint.into(),
            output_mint: output_mint.into(),
            amount,
            ..Default::default()
        }
    }

    pub fn slippage_bps(mut self, bps: u16) -> Self {
        self.slippage_bps = Some(bps);
        self
    }

    pub fn swap_mode(mut self, mode: SwapMode) -> Self {
        self.swap_mode = Some(mode);
        self
    }

    pub fn only_direct_routes(mut self, only: bool) -> Self {
        self.only_direct_routes = Some(only);
        self
    }

    pub fn restrict_intermediate_tokens(mut self, restrict: bool) -> Self {
        self.restrict_intermediate_tokens = Some(restrict);
        self
    }

    pub fn max_accounts(mut self, max: u32) -> Self {
        self.max_accounts = Some(max);
        self
    }

    pub fn dexes(mut self, dexes: Vec<String>) -> Self {
        self.dexes = dexes;
        self
    }

    pub fn exclude_dexes(mut self, dexes: Vec<String>) -> Self {
        self.exclude_dexes = dexes;
        self
    }

    /// Wire query pairs, in the order the service documents them.
    ///
    /// Unset options are omitted rather than sent with a default.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("inputMint".to_string(), self.input_mint.clone()),
            ("outputMint".to_string(), self.output_mint.clone()),
            ("amount".to_string(), self.amount.to_string()),
        ];
        if let Some(bps) = self.slippage_bps {
            query.push(("slippageBps".into(), bps.to_string()));
        }
        if let Some(mode) = self.swap_mode {
            query.push(("swapMode".into(), mode.as_str().into()));
        }
        if let Some(only) = self.only_direct_routes {
            query.push(("onlyDirectRoutes".into(), only.to_string()));
        }
        if let Some(restrict) = self.restrict_intermediate_tokens {
            query.push(("restrictIntermediateTokens".into(), restrict.to_string()));
        }
        if let Some(max) = self.max_accounts {
            query.push(("maxAccounts".into(), max.to_string()));
        }
        if !self.dexes.is_empty() {
            query.push(("dexes".into(), self.dexes.join(",")));
        }
        if !self.exclude_dexes.is_empty() {
            query.push(("excludeDexes".into(), self.exclude_dexes.join(",")));
        }
        query
    }
}

/// Body of a successful `GET /quote`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub in_amount: String,
    pub output_mint: String,
    pub out_amount: String,
    #[serde(default)]
    pub other_amount_threshold: String,
    #[serde(default)]
    pub swap_mode: SwapMode,
    #[serde(default)]
    pub slippage_bps: u16,
    #[serde(default)]
    pub price_impact_pct: String,
    #[serde(default)]
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_slot: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<f64>,
}

impl QuoteResponse {
    /// Output amount as a positive finite number, `None` otherwise.
    pub fn out_amount_value(&self) -> Option<f64> {
        parse_amount(&self.out_amount)
    }
}

/// Parse a decimal amount string into a positive finite `f64`.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// One hop (or split) of a quoted route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    pub percent: u8,
}

/// The AMM leg executed by a [`RoutePlanStep`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    pub amm_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    #[serde(default)]
    pub fee_amount: String,
    #[serde(default)]
    pub fee_mint: String,
}
