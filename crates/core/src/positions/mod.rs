//! Option positions and their profit.

pub mod model;
pub mod profit;
pub mod store;

pub use model::{NewPosition, Position, PositionSide, PositionStatus, PositionUpdate};
pub use profit::{contract_profit, position_profit, profit_series, PositionProfit};
pub use store::PositionStore;
