//! Position domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use optionwatch_market_data::OptionType;

use crate::chains::ExpirationId;
use crate::errors::{Result, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Buy,
    Sell,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Buy => "BUY",
            PositionSide::Sell => "SELL",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "BUY" => Ok(PositionSide::Buy),
            "SELL" => Ok(PositionSide::Sell),
            other => Err(ValidationError::InvalidInput(format!("Unknown position side: {}", other)).into()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
    Expired,
}

impl PositionStatus {
    /// CLOSED once a close date exists, EXPIRED after the expiration day,
    /// OPEN otherwise.
    pub fn derive(close_date: Option<NaiveDate>, expiration: NaiveDate, today: NaiveDate) -> Self {
        if close_date.is_some() {
            PositionStatus::Closed
        } else if today > expiration {
            PositionStatus::Expired
        } else {
            PositionStatus::Open
        }
    }
}

/// A bookkept option position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub symbol: String,
    pub option_type: OptionType,
    pub side: PositionSide,
    pub strike: f64,
    pub expiration_id: ExpirationId,
    /// Expiration date of the referenced series
    pub expiration: NaiveDate,
    pub open_date: NaiveDate,
    /// Option premium per share at open
    pub open_price: Decimal,
    pub close_date: Option<NaiveDate>,
    pub close_price: Option<Decimal>,
    pub stock_price_open: Option<Decimal>,
    pub stock_price_close: Option<Decimal>,
}

impl Position {
    pub fn status(&self, today: NaiveDate) -> PositionStatus {
        PositionStatus::derive(self.close_date, self.expiration, today)
    }
}

/// Input model for opening a position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewPosition {
    pub symbol: String,
    pub option_type: OptionType,
    pub side: PositionSide,
    pub strike: f64,
    pub expiration_id: ExpirationId,
    pub open_date: NaiveDate,
    pub open_price: Decimal,
    pub stock_price_open: Option<Decimal>,
}

impl NewPosition {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(ValidationError::InvalidInput(format!("Invalid strike: {}", self.strike)).into());
        }
        if self.open_price.is_sign_negative() {
            return Err(ValidationError::InvalidInput("Open price cannot be negative".to_string()).into());
        }
        Ok(())
    }
}

/// Fields that change when a position is closed or corrected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub open_price: Option<Decimal>,
    pub close_date: Option<NaiveDate>,
    pub close_price: Option<Decimal>,
    pub stock_price_close: Option<Decimal>,
}

impl PositionUpdate {
    pub fn validate(&self, position: &Position) -> Result<()> {
        if self.close_price.is_some() != self.close_date.is_some() {
            return Err(ValidationError::InvalidInput(
                "close_date and close_price must be set together".to_string(),
            )
            .into());
        }
        if let Some(close_date) = self.close_date {
            if close_date < position.open_date {
                return Err(ValidationError::InvalidInput(format!(
                    "Close date {} is before open date {}",
                    close_date, position.open_date
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_derivation() {
        let expiration = date(2024, 3, 15);
        assert_eq!(
            PositionStatus::derive(Some(date(2024, 3, 1)), expiration, date(2024, 4, 1)),
            PositionStatus::Closed
        );
        assert_eq!(
            PositionStatus::derive(None, expiration, date(2024, 3, 15)),
            PositionStatus::Open
        );
        assert_eq!(
            PositionStatus::derive(None, expiration, date(2024, 3, 16)),
            PositionStatus::Expired
        );
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(PositionSide::parse("sell").unwrap(), PositionSide::Sell);
        assert_eq!(PositionSide::parse("BUY").unwrap(), PositionSide::Buy);
        assert!(PositionSide::parse("hold").is_err());
    }

    #[test]
    fn test_new_position_validation() {
        let mut p = NewPosition {
            symbol: "TSLA".to_string(),
            option_type: OptionType::Call,
            side: PositionSide::Sell,
            strike: 200.0,
            expiration_id: 1,
            open_date: date(2024, 3, 1),
            open_price: dec!(4.25),
            stock_price_open: Some(dec!(190.10)),
        };
        assert!(p.validate().is_ok());

        p.strike = 0.0;
        assert!(p.validate().is_err());
    }
}
