//! Options chain models
//!
//! This module contains the canonical data types every data source produces:
//! - `types` - Identifiers and small enums (ProviderId, OptionType, ChainSide)
//! - `contract` - One option leg (Contract) and the calls/puts pair (OptionsChain)
//! - `quote` - A normalized chain snapshot (Quote) and the underlying price (StockPrice)

mod contract;
mod quote;
mod types;

pub use contract::{in_the_money, Contract, OptionsChain};
pub use quote::{truncate_to_seconds, Quote, StockPrice};
pub use types::{ChainSide, OptionType, ProviderId};
