//! Realized and unrealized profit of option positions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::{Position, PositionSide, PositionStatus};
use crate::constants::CONTRACT_MULTIPLIER;
use crate::errors::{Result, ValidationError};
use crate::snapshots::{Metric, SnapshotMatrix};

/// Profit of one contract, split by whether it is locked in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionProfit {
    pub status: PositionStatus,
    pub realized: Option<Decimal>,
    pub unrealized: Option<Decimal>,
}

impl PositionProfit {
    pub fn total(&self) -> Decimal {
        self.realized.unwrap_or_default() + self.unrealized.unwrap_or_default()
    }
}

fn multiplier() -> Decimal {
    Decimal::from(CONTRACT_MULTIPLIER)
}

/// Profit per contract for an exit at `exit_price`.
pub fn contract_profit(side: PositionSide, open_price: Decimal, exit_price: Decimal) -> Decimal {
    match side {
        PositionSide::Buy => (exit_price - open_price) * multiplier(),
        PositionSide::Sell => (open_price - exit_price) * multiplier(),
    }
}

/// Profit of a position on `today`.
///
/// Closed positions exit at their close price and expired ones at their
/// close price or zero; both are realized. Open positions are marked at
/// `mark`, and have no unrealized profit when no mark is available.
pub fn position_profit(
    position: &Position,
    mark: Option<Decimal>,
    today: NaiveDate,
) -> PositionProfit {
    let status = position.status(today);
    let profit = |exit: Decimal| contract_profit(position.side, position.open_price, exit);

    match status {
        PositionStatus::Closed => PositionProfit {
            status,
            realized: position.close_price.map(profit),
            unrealized: None,
        },
        PositionStatus::Expired => PositionProfit {
            status,
            realized: Some(profit(position.close_price.unwrap_or(Decimal::ZERO))),
            unrealized: None,
        },
        PositionStatus::Open => PositionProfit {
            status,
            realized: None,
            unrealized: mark.map(profit),
        },
    }
}

/// Unrealized profit over time, marking the position at each bid.
///
/// # Returns
///
/// `Ok(None)` when the matrix never quoted the position's strike. A
/// `Validation` error when the matrix is not a BID matrix of the position's
/// option type.
pub fn profit_series(
    position: &Position,
    matrix: &SnapshotMatrix,
) -> Result<Option<Vec<(DateTime<Utc>, f64)>>> {
    if matrix.metric != Metric::Bid || matrix.option_type != position.option_type {
        return Err(ValidationError::InvalidInput(format!(
            "Profit needs a BID matrix of {} options, got {:?} of {}",
            position.option_type, matrix.metric, matrix.option_type
        ))
        .into());
    }
    let open = position
        .open_price
        .to_f64()
        .ok_or_else(|| ValidationError::InvalidInput(format!("Open price {}", position.open_price)))?;
    let multiplier = CONTRACT_MULTIPLIER as f64;

    Ok(matrix.strike_series(position.strike).map(|column| {
        column
            .into_iter()
            .map(|(time, bid)| {
                let value = match position.side {
                    PositionSide::Buy => (bid - open) * multiplier,
                    PositionSide::Sell => (open - bid) * multiplier,
                };
                (time, value)
            })
            .collect()
    }))
}
