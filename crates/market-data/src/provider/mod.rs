//! Options data source abstractions and implementations.
//!
//! This module contains:
//! - The `OptionsDataSource` trait that all vendors implement
//! - Rate limiting configuration
//! - Concrete vendors (Tradier, Yahoo)
//!
//! Vendors are interchangeable: the collector holds an
//! `Arc<dyn OptionsDataSource>` and never branches on which one it got.

mod capabilities;
mod traits;

pub mod tradier;
pub mod yahoo;

// Re-exports
pub use capabilities::RateLimit;
pub use traits::OptionsDataSource;
