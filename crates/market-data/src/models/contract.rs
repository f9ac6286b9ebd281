use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::OptionType;

/// One option leg of a chain, in canonical form.
///
/// Every optional field is explicit: greeks are `None` when the vendor did
/// not send them, while `change` is defaulted to `0.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Vendor contract symbol (OCC style), when the vendor sends one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_symbol: Option<String>,

    pub option_type: OptionType,

    pub strike: f64,

    /// Time of the last trade, seconds precision
    pub last_trade_time: DateTime<Utc>,

    pub last_price: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,

    /// Price change since previous close. `0.0` when the vendor omits it.
    pub change: f64,

    pub volume: Option<u64>,
    pub open_interest: Option<u64>,

    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,

    /// Derived from strike and underlying price, see [`in_the_money`]
    pub in_the_money: bool,
}

impl Contract {
    /// Create a contract with only the required fields set.
    pub fn new(
        option_type: OptionType,
        strike: f64,
        last_trade_time: DateTime<Utc>,
        current_price: f64,
    ) -> Self {
        Self {
            contract_symbol: None,
            option_type,
            strike,
            last_trade_time,
            last_price: None,
            bid: None,
            ask: None,
            change: 0.0,
            volume: None,
            open_interest: None,
            implied_volatility: None,
            delta: None,
            gamma: None,
            theta: None,
            vega: None,
            in_the_money: in_the_money(option_type, strike, current_price),
        }
    }

    /// Builder-style bid/ask setter, mostly used by tests and screeners.
    pub fn with_quote(mut self, bid: f64, ask: f64) -> Self {
        self.bid = Some(bid);
        self.ask = Some(ask);
        self
    }

    /// True when both sides of the quote are zero (or missing).
    ///
    /// Vendors publish 0/0 during instrumentation hiccups; such rows are not
    /// a real zero price and derived metrics treat them as missing.
    pub fn is_unquoted(&self) -> bool {
        self.bid.unwrap_or(0.0) == 0.0 && self.ask.unwrap_or(0.0) == 0.0
    }
}

/// CALL is in the money iff `strike <= price`, PUT iff `strike >= price`.
pub fn in_the_money(option_type: OptionType, strike: f64, current_price: f64) -> bool {
    match option_type {
        OptionType::Call => strike <= current_price,
        OptionType::Put => strike >= current_price,
    }
}

/// Calls and puts for one expiration at one instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsChain {
    pub calls: Vec<Contract>,
    pub puts: Vec<Contract>,
}

impl OptionsChain {
    pub fn new(calls: Vec<Contract>, puts: Vec<Contract>) -> Self {
        Self { calls, puts }
    }

    pub fn side(&self, option_type: OptionType) -> &[Contract] {
        match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }

    /// All contracts, calls first.
    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.calls.iter().chain(self.puts.iter())
    }
}
