//! Tradier API response structures.
//!
//! Tradier collapses single-element arrays into a bare object and reports
//! "nothing" as `null`, so most containers are `Option<OneOrMany<T>>`.
//! Chain rows are decoded one by one so a malformed row is dropped alone.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::normalizer::decode_one_or_many;

/// A JSON value that is either a single `T` or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

// ============================================================================
// /markets/quotes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TradierQuotesResponse {
    pub quotes: Option<TradierQuotes>,
}

#[derive(Debug, Deserialize)]
pub struct TradierQuotes {
    #[serde(default)]
    pub quote: Option<OneOrMany<TradierQuote>>,
}

#[derive(Debug, Deserialize)]
pub struct TradierQuote {
    pub symbol: String,
    #[serde(default)]
    pub last: Option<f64>,
    /// Epoch milliseconds
    #[serde(default)]
    pub trade_date: Option<i64>,
}

// ============================================================================
// /markets/options/expirations
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TradierExpirationsResponse {
    pub expirations: Option<TradierExpirations>,
}

#[derive(Debug, Deserialize)]
pub struct TradierExpirations {
    #[serde(default)]
    pub date: Option<OneOrMany<String>>,
}

// ============================================================================
// /markets/options/chains
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TradierChainResponse {
    pub options: Option<TradierOptions>,
}

#[derive(Debug, Deserialize)]
pub struct TradierOptions {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub option: Option<Vec<TradierOption>>,
}

fn lenient_rows<'de, D>(deserializer: D) -> Result<Option<Vec<TradierOption>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decode_one_or_many(Value::deserialize(deserializer)?))
}

#[derive(Debug, Deserialize)]
pub struct TradierOption {
    #[serde(default)]
    pub symbol: Option<String>,
    /// "call" or "put"
    pub option_type: String,
    #[serde(default)]
    pub strike: Option<f64>,
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub volume: Option<u64>,
    #[serde(default)]
    pub open_interest: Option<u64>,
    /// Epoch milliseconds, 0 when never traded
    #[serde(default)]
    pub trade_date: Option<i64>,
    #[serde(default)]
    pub greeks: Option<TradierGreeks>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TradierGreeks {
    #[serde(default)]
    pub mid_iv: Option<f64>,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub gamma: Option<f64>,
    #[serde(default)]
    pub theta: Option<f64>,
    #[serde(default)]
    pub vega: Option<f64>,
}
