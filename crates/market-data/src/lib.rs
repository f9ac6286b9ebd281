//! OptionWatch Market Data Crate
//!
//! Canonical options chain model plus the vendor-facing half of the
//! collection pipeline.
//!
//! # Overview
//!
//! The market data crate provides:
//! - The canonical [`Quote`] / [`Contract`] shape every vendor maps to
//! - Monthly expiration classification with vendor date correction
//! - A [`ChainNormalizer`] contract with one implementation per vendor
//! - The [`OptionsDataSource`] trait and Tradier / Yahoo implementations
//! - Per-vendor request throttling
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  Vendor payload  |  (Tradier JSON, Yahoo JSON)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! | ChainNormalizer  | --> |    finalize()    |  (drop bad strikes, sort, dedup)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |      Quote       |  (symbol, as_of, price, chain)
//!                          +------------------+
//!                                  |
//!                                  v
//!                     filters / storage / matrices (core crate)
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - One chain snapshot for a symbol and expiration
//! - [`Contract`] - One option leg with explicit optional fields
//! - [`OptionsChain`] - Calls and puts
//! - [`OptionType`] / [`ChainSide`] - Leg type and side selection

pub mod errors;
pub mod expiration;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod throttle;

pub use models::{
    in_the_money, truncate_to_seconds, ChainSide, Contract, OptionType, OptionsChain, ProviderId,
    Quote, StockPrice,
};

pub use expiration::{
    enumerate_next_n_monthly_expirations, is_monthly_expiration, parse_expiration, EXPIRATION_FORMAT,
};
pub use normalizer::ChainNormalizer;
pub use throttle::RequestThrottle;

// Re-export provider types
pub use provider::tradier::TradierProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{OptionsDataSource, RateLimit};

pub use errors::{MarketDataError, RetryClass};
