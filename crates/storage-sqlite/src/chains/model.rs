//! Database models for expiration series and their snapshots.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use optionwatch_core::chains::Expiration;
use optionwatch_market_data::{Contract, OptionType};

use crate::errors::StorageError;

#[derive(Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::expirations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExpirationDB {
    pub id: i64,
    pub symbol: String,
    pub expiration_date: NaiveDate,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::expirations)]
pub struct NewExpirationDB {
    pub symbol: String,
    pub expiration_date: NaiveDate,
}

impl From<ExpirationDB> for Expiration {
    fn from(db: ExpirationDB) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            expiration: db.expiration_date,
        }
    }
}

/// Snapshot header: underlying price at collection time.
#[derive(
    Queryable, Identifiable, Associations, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(belongs_to(ExpirationDB, foreign_key = expiration_id))]
#[diesel(table_name = crate::schema::stock_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StockPriceDB {
    pub id: i64,
    pub expiration_id: i64,
    pub as_of: NaiveDateTime,
    pub price: f64,
    pub source: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::stock_prices)]
pub struct NewStockPriceDB {
    pub expiration_id: i64,
    pub as_of: NaiveDateTime,
    pub price: f64,
    pub source: String,
}

#[derive(Queryable, Identifiable, Associations, Selectable, PartialEq, Debug, Clone)]
#[diesel(belongs_to(StockPriceDB, foreign_key = stock_price_id))]
#[diesel(table_name = crate::schema::option_contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OptionContractDB {
    pub id: i64,
    pub stock_price_id: i64,
    pub option_type: String,
    pub contract_symbol: Option<String>,
    pub strike: f64,
    pub last_trade_time: NaiveDateTime,
    pub last_price: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub change: f64,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
    pub in_the_money: bool,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::option_contracts)]
pub struct NewOptionContractDB {
    pub stock_price_id: i64,
    pub option_type: String,
    pub contract_symbol: Option<String>,
    pub strike: f64,
    pub last_trade_time: NaiveDateTime,
    pub last_price: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub change: f64,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
    pub in_the_money: bool,
}

fn to_db_count(value: Option<u64>) -> Option<i64> {
    value.map(|v| i64::try_from(v).unwrap_or(i64::MAX))
}

fn from_db_count(value: Option<i64>) -> Option<u64> {
    value.and_then(|v| u64::try_from(v).ok())
}

impl NewOptionContractDB {
    pub fn from_contract(stock_price_id: i64, contract: &Contract) -> Self {
        Self {
            stock_price_id,
            option_type: contract.option_type.as_str().to_string(),
            contract_symbol: contract.contract_symbol.clone(),
            strike: contract.strike,
            last_trade_time: contract.last_trade_time.naive_utc(),
            last_price: contract.last_price,
            bid: contract.bid,
            ask: contract.ask,
            change: contract.change,
            volume: to_db_count(contract.volume),
            open_interest: to_db_count(contract.open_interest),
            implied_volatility: contract.implied_volatility,
            delta: contract.delta,
            gamma: contract.gamma,
            theta: contract.theta,
            vega: contract.vega,
            in_the_money: contract.in_the_money,
        }
    }
}

impl TryFrom<OptionContractDB> for Contract {
    type Error = StorageError;

    fn try_from(db: OptionContractDB) -> Result<Self, Self::Error> {
        let option_type: OptionType = db
            .option_type
            .parse()
            .map_err(|_| StorageError::CorruptRow(format!("option type '{}'", db.option_type)))?;
        Ok(Contract {
            contract_symbol: db.contract_symbol,
            option_type,
            strike: db.strike,
            last_trade_time: db.last_trade_time.and_utc(),
            last_price: db.last_price,
            bid: db.bid,
            ask: db.ask,
            change: db.change,
            volume: from_db_count(db.volume),
            open_interest: from_db_count(db.open_interest),
            implied_volatility: db.implied_volatility,
            delta: db.delta,
            gamma: db.gamma,
            theta: db.theta,
            vega: db.vega,
            in_the_money: db.in_the_money,
        })
    }
}
