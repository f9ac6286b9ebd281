//! Periodic chain collection.

mod service;


pub use service::{CollectionReport, CollectorService};
