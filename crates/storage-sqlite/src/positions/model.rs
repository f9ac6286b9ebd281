//! Database models for positions.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use optionwatch_core::positions::{NewPosition, Position, PositionSide};
use optionwatch_market_data::OptionType;

use crate::errors::StorageError;

/// Decimals are stored as text to keep their exact scale.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDB {
    pub id: String,
    pub symbol: String,
    pub option_type: String,
    pub side: String,
    pub strike: f64,
    pub expiration_id: i64,
    pub open_date: NaiveDate,
    pub open_price: String,
    pub close_date: Option<NaiveDate>,
    pub close_price: Option<String>,
    pub stock_price_open: Option<String>,
    pub stock_price_close: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn parse_decimal(value: &str, field: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|e| StorageError::CorruptRow(format!("{} '{}': {}", field, value, e)))
}

fn parse_optional_decimal(value: Option<&str>, field: &str) -> Result<Option<Decimal>, StorageError> {
    value.map(|v| parse_decimal(v, field)).transpose()
}

impl PositionDB {
    pub fn from_new(id: String, new: NewPosition, now: NaiveDateTime) -> Self {
        Self {
            id,
            symbol: new.symbol.trim().to_uppercase(),
            option_type: new.option_type.as_str().to_string(),
            side: new.side.as_str().to_string(),
            strike: new.strike,
            expiration_id: new.expiration_id,
            open_date: new.open_date,
            open_price: new.open_price.to_string(),
            close_date: None,
            close_price: None,
            stock_price_open: new.stock_price_open.map(|d| d.to_string()),
            stock_price_close: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Domain position, given the expiration date of its series.
    pub fn into_domain(self, expiration: NaiveDate) -> Result<Position, StorageError> {
        let option_type = OptionType::from_str(&self.option_type)
            .map_err(|_| StorageError::CorruptRow(format!("option type '{}'", self.option_type)))?;
        let side = PositionSide::parse(&self.side)
            .map_err(|_| StorageError::CorruptRow(format!("position side '{}'", self.side)))?;
        Ok(Position {
            option_type,
            side,
            strike: self.strike,
            expiration_id: self.expiration_id,
            expiration,
            open_date: self.open_date,
            open_price: parse_decimal(&self.open_price, "open_price")?,
            close_date: self.close_date,
            close_price: parse_optional_decimal(self.close_price.as_deref(), "close_price")?,
            stock_price_open: parse_optional_decimal(
                self.stock_price_open.as_deref(),
                "stock_price_open",
            )?,
            stock_price_close: parse_optional_decimal(
                self.stock_price_close.as_deref(),
                "stock_price_close",
            )?,
            id: self.id,
            symbol: self.symbol,
        })
    }
}
