//! OptionWatch Core - Chain filtering, snapshot matrices, screening and forecasting.
//!
//! This crate holds the domain logic for tracking option chains over time.
//! It is database-agnostic and defines the `ChainStore` and `PositionStore`
//! traits that are implemented by the `storage-sqlite` crate.

pub mod chains;
pub mod collector;
pub mod config;
pub mod constants;
pub mod errors;
pub mod forecast;
pub mod positions;
pub mod snapshots;

pub use chains::{BestStrikeSelector, ChainStore, FilterPipeline, Screener};
pub use collector::{CollectionReport, CollectorService};
pub use config::CollectorConfig;
pub use positions::PositionStore;
pub use snapshots::{Metric, SnapshotMatrix, SnapshotMatrixBuilder, SnapshotService};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
