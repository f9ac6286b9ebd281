use async_trait::async_trait;

use super::model::{NewPosition, Position, PositionUpdate};
use crate::errors::Result;

/// Storage interface for positions.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Stores a new position under a fresh id.
    async fn add(&self, position: NewPosition) -> Result<Position>;

    async fn update(&self, position_id: &str, update: PositionUpdate) -> Result<Position>;

    /// # Returns
    ///
    /// Number of positions removed (0 or 1)
    async fn delete(&self, position_id: &str) -> Result<usize>;

    fn get(&self, position_id: &str) -> Result<Option<Position>>;

    /// Positions of one symbol, or all of them, newest open date first.
    fn list(&self, symbol: Option<&str>) -> Result<Vec<Position>>;
}
