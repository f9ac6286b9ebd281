//! Chain processing module.
//!
//! - [`filters`] - Staleness, at-the-money window and decimation filters
//! - [`selector`] - Strike closest to a target out-of-the-money percentage
//! - [`screener`] - Covered-call yield screening built on the selector
//! - [`store`] - Storage trait for expiration series

pub mod filters;
pub mod screener;
pub mod selector;
pub mod store;

pub use filters::{
    ChainFilter, DecimationFilter, FilterPipeline, MoneynessWindowFilter, StalenessFilter,
};
pub use screener::{Screener, ScreenerRow};
pub use selector::{BestStrikeSelector, StrikeSelection};
pub use store::{ChainStore, Expiration, ExpirationId};
