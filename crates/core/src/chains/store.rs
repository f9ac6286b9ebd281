//! Chain snapshot storage trait.
//!
//! The store is the append-only persistence collaborator for expiration
//! series. Implementations must serialize writes so that snapshots of one
//! series are appended in collection order.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use optionwatch_market_data::{OptionType, Quote};

use crate::errors::Result;

/// Stable surrogate key of an expiration series.
pub type ExpirationId = i64;

/// One `(symbol, expiration)` series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiration {
    pub id: ExpirationId,
    pub symbol: String,
    pub expiration: NaiveDate,
}

/// Storage interface for expiration series and their snapshots.
///
/// # Design Notes
///
/// - Async methods are used for mutations (they go through the single writer)
/// - Sync methods are used for reads
#[async_trait]
pub trait ChainStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Appends a snapshot to its series, creating the series on first sight.
    ///
    /// Re-appending a snapshot already stored for the same observation time
    /// is a no-op, as is a contract row already stored for that snapshot.
    ///
    /// # Returns
    ///
    /// The id of the series the snapshot belongs to
    async fn append(&self, quote: &Quote) -> Result<ExpirationId>;

    /// Deletes one series with all of its snapshots.
    ///
    /// # Returns
    ///
    /// Number of series removed (0 or 1)
    async fn delete_expiration(&self, expiration_id: ExpirationId) -> Result<usize>;

    /// Deletes every series of a symbol.
    ///
    /// # Returns
    ///
    /// Number of series removed
    async fn delete_symbol(&self, symbol: &str) -> Result<usize>;

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshots of a series in insertion order, bounds inclusive.
    fn query_range(
        &self,
        expiration_id: ExpirationId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Quote>>;

    /// Series for one symbol, or all of them, ordered by symbol then date.
    fn list_expirations(&self, symbol: Option<&str>) -> Result<Vec<Expiration>>;

    fn find_expiration(&self, symbol: &str, expiration: NaiveDate) -> Result<Option<Expiration>>;

    fn get_expiration(&self, expiration_id: ExpirationId) -> Result<Option<Expiration>>;

    /// Distinct symbols with at least one series.
    fn list_symbols(&self) -> Result<Vec<String>>;

    /// Every strike ever stored for a series and option type, ascending.
    fn unique_strikes(
        &self,
        expiration_id: ExpirationId,
        option_type: OptionType,
    ) -> Result<Vec<f64>>;
}
