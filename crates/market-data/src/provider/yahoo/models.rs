//! Yahoo Finance options API response models.
//!
//! These models cover the `v7/finance/options/{symbol}` endpoint, which
//! returns the underlying quote, the list of expiration epochs and the
//! chain for one expiration.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::normalizer::decode_one_or_many;

/// Main response wrapper
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooOptionsResponse {
    pub option_chain: YahooOptionChain,
}

#[derive(Debug, Deserialize)]
pub struct YahooOptionChain {
    #[serde(default)]
    pub result: Vec<YahooOptionResult>,
    // Note: error field exists in API but we handle errors via HTTP status/empty results
}

/// One symbol's result
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooOptionResult {
    #[serde(default)]
    pub underlying_symbol: Option<String>,
    /// Expiration epochs in seconds (midnight UTC)
    #[serde(default)]
    pub expiration_dates: Vec<i64>,
    #[serde(default)]
    pub quote: Option<YahooUnderlyingQuote>,
    #[serde(default)]
    pub options: Vec<YahooOptionBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooUnderlyingQuote {
    pub regular_market_price: Option<f64>,
    pub regular_market_time: Option<i64>,
}

/// Calls and puts for one expiration
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooOptionBlock {
    #[serde(default)]
    pub expiration_date: Option<i64>,
    #[serde(default, deserialize_with = "lenient_contracts")]
    pub calls: Vec<YahooContract>,
    #[serde(default, deserialize_with = "lenient_contracts")]
    pub puts: Vec<YahooContract>,
}

/// Contract rows decoded one at a time; malformed rows are dropped.
fn lenient_contracts<'de, D>(deserializer: D) -> Result<Vec<YahooContract>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decode_one_or_many(Value::deserialize(deserializer)?).unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooContract {
    pub contract_symbol: Option<String>,
    pub strike: Option<f64>,
    pub last_price: Option<f64>,
    pub change: Option<f64>,
    pub volume: Option<u64>,
    pub open_interest: Option<u64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub implied_volatility: Option<f64>,
    /// Epoch seconds
    pub last_trade_date: Option<i64>,
}
