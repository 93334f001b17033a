//! Quote fingerprints.
//!
//! A [`Fingerprint`] identifies a quote by the tuple
//! `(inputMint, outputMint, amount, slippageBps)` only. Routing preferences
//! (`onlyDirectRoutes`, `dexes`, `maxAccounts`, ...) are deliberately not
//! part of the key: two quotes that differ only in routing share an entry.
//! This is a known coarseness of the cache, not an oversight.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};
use tracing::warn;

/// Query parameters that make up the fingerprint.
const KEY_PARAMS: [&str; 4] = ["inputMint", "outputMint", "amount", "slippageBps"];

/// Number of digest bytes kept (rendered as twice as many hex chars).
const FINGERPRINT_BYTES: usize = 16;

/// The semantically relevant subset of a quote request.
///
/// Missing parameters stay `None`; they are never defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteKey {
    pub input_mint: Option<String>,
    pub output_mint: Option<String>,
    pub amount: Option<String>,
    pub slippage_bps: Option<String>,
}

impl QuoteKey {
    /// Extract the key parameters from query pairs.
    ///
    /// When a parameter repeats, the last occurrence wins.
    pub fn from_query<K, V>(query: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut key = QuoteKey::default();
        for (name, value) in query {
            let value = Some(value.as_ref().to_string());
            match name.as_ref() {
                "inputMint" => key.input_mint = value,
                "outputMint" => key.output_mint = value,
                "amount" => key.amount = value,
                "slippageBps" => key.slippage_bps = value,
                _ => {}
            }
        }
        key
    }

    /// Canonical serialization: a JSON object with sorted keys, absent
    /// parameters omitted.
    fn canonical(&self) -> String {
        let fields = [
            &self.input_mint,
            &self.output_mint,
            &self.amount,
            &self.slippage_bps,
        ];
        let map: BTreeMap<&str, &str> = KEY_PARAMS
            .iter()
            .zip(fields)
            .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v)))
            .collect();
        serde_json::to_string(&map).unwrap_or_default()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::digest(self.canonical().as_bytes())
    }
}

/// Fixed-length opaque cache key (32 lowercase hex chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    fn digest(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        Self(
            hash[..FINGERPRINT_BYTES]
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect(),
        )
    }

    /// Fingerprint of a request's query pairs.
    pub fn from_query<K, V>(query: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        QuoteKey::from_query(query).fingerprint()
    }

    /// Fingerprint of a full request URL.
    ///
    /// Never fails: an unparseable URL is hashed verbatim, so it still gets
    /// a stable (if less useful) key.
    pub fn from_url(raw: &str) -> Self {
        match url::Url::parse(raw) {
            Ok(url) => {
                let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
                Self::from_query(&pairs)
            }
            Err(e) => {
                warn!(error = %e, "unparseable quote URL, hashing raw text");
                Self::digest(raw.as_bytes())
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
