use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Provider identifier - mostly static constants
pub type ProviderId = Cow<'static, str>;

/// Call or put.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "CALL",
            OptionType::Put => "PUT",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = MarketDataError;

    /// Vendors disagree on casing ("call", "CALL", "Call"), so matching is
    /// case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("call") {
            Ok(OptionType::Call)
        } else if s.eq_ignore_ascii_case("put") {
            Ok(OptionType::Put)
        } else {
            Err(MarketDataError::ValidationFailed {
                message: format!("Unknown option type: {}", s),
            })
        }
    }
}

/// Which side(s) of a chain a caller wants normalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainSide {
    #[default]
    Both,
    Calls,
    Puts,
}

impl ChainSide {
    pub fn includes(&self, option_type: OptionType) -> bool {
        matches!(
            (self, option_type),
            (ChainSide::Both, _)
                | (ChainSide::Calls, OptionType::Call)
                | (ChainSide::Puts, OptionType::Put)
        )
    }
}
