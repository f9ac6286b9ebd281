//! Snapshot matrices and the views built on them.

pub mod matrix;
pub mod service;


pub use matrix::{Metric, SnapshotMatrix, SnapshotMatrixBuilder};
pub use service::SnapshotService;
