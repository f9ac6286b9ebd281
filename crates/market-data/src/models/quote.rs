use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::contract::{Contract, OptionsChain};
use super::types::OptionType;

/// A normalized chain snapshot for one symbol and expiration.
///
/// Immutable once built: the collector appends it to the expiration series
/// and nothing rewrites it afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Underlying symbol
    pub symbol: String,

    /// Observation time (UTC, seconds precision)
    pub as_of: DateTime<Utc>,

    /// Underlying price at `as_of`
    pub current_price: f64,

    pub expiration: NaiveDate,

    pub chain: OptionsChain,

    /// Source of the quote (TRADIER, YAHOO, ...)
    pub source: String,
}

impl Quote {
    /// Create a quote; `as_of` is truncated to whole seconds.
    pub fn new(
        symbol: impl Into<String>,
        as_of: DateTime<Utc>,
        current_price: f64,
        expiration: NaiveDate,
        chain: OptionsChain,
        source: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            as_of: truncate_to_seconds(as_of),
            current_price,
            expiration,
            chain,
            source: source.into(),
        }
    }

    pub fn contracts(&self, option_type: OptionType) -> &[Contract] {
        self.chain.side(option_type)
    }
}

/// Underlying price observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockPrice {
    pub symbol: String,
    pub price: f64,
    pub as_of: DateTime<Utc>,
}

/// Drop sub-second precision.
pub fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(ts.timestamp(), 0).single().unwrap_or(ts)
}
