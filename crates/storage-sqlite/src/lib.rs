//! SQLite storage implementation for OptionWatch.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the store traits defined in `optionwatch-core` and contains:
//! - Database connection pooling and management
//! - Embedded Diesel migrations
//! - The single writer actor that serializes mutations
//! - Repository implementations for expiration series and positions
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies exist.
//!
//! ```text
//! market-data (vendors)     core (domain)
//!        │                      │
//!        └──────────┬───────────┘
//!                   │
//!                   ▼
//!         storage-sqlite (this crate)
//!                   │
//!                   ▼
//!               SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod chains;
pub mod positions;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

pub use chains::ChainRepository;
pub use positions::PositionRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from optionwatch-core for convenience
pub use optionwatch_core::errors::{DatabaseError, Error, Result};
