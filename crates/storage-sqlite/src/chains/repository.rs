use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;

use optionwatch_core::chains::{ChainStore, Expiration, ExpirationId};
use optionwatch_core::Result;
use optionwatch_market_data::{Contract, OptionType, OptionsChain, Quote};

use super::model::{
    ExpirationDB, NewExpirationDB, NewOptionContractDB, NewStockPriceDB, OptionContractDB,
    StockPriceDB,
};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{expirations, option_contracts, stock_prices};
use crate::utils::chunk_for_sqlite;

pub struct ChainRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

/// Id of the `(symbol, expiration)` series, inserting it when missing.
fn find_or_create_expiration(conn: &mut SqliteConnection, quote: &Quote) -> Result<i64> {
    let existing = expirations::table
        .filter(expirations::symbol.eq(&quote.symbol))
        .filter(expirations::expiration_date.eq(quote.expiration))
        .select(expirations::id)
        .first::<i64>(conn)
        .optional()
        .into_core()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let new_row = NewExpirationDB {
        symbol: quote.symbol.clone(),
        expiration_date: quote.expiration,
    };
    let id = diesel::insert_into(expirations::table)
        .values(&new_row)
        .returning(expirations::id)
        .get_result::<i64>(conn)
        .into_core()?;
    debug!("Created series {} for {} {}", id, quote.symbol, quote.expiration);
    Ok(id)
}

/// Id of the snapshot header for `quote`, inserting it when missing.
fn find_or_create_stock_price(
    conn: &mut SqliteConnection,
    expiration_id: i64,
    quote: &Quote,
) -> Result<i64> {
    let as_of = quote.as_of.naive_utc();
    let existing = stock_prices::table
        .filter(stock_prices::expiration_id.eq(expiration_id))
        .filter(stock_prices::as_of.eq(as_of))
        .select(stock_prices::id)
        .first::<i64>(conn)
        .optional()
        .into_core()?;
    if let Some(id) = existing {
        debug!(
            "Snapshot {} {} at {} already stored",
            quote.symbol, quote.expiration, quote.as_of
        );
        return Ok(id);
    }

    let new_row = NewStockPriceDB {
        expiration_id,
        as_of,
        price: quote.current_price,
        source: quote.source.clone(),
    };
    diesel::insert_into(stock_prices::table)
        .values(&new_row)
        .returning(stock_prices::id)
        .get_result::<i64>(conn)
        .into_core()
}

fn into_quote(
    series: &ExpirationDB,
    header: StockPriceDB,
    rows: Vec<OptionContractDB>,
) -> std::result::Result<Quote, StorageError> {
    let mut chain = OptionsChain::default();
    for row in rows {
        let contract = Contract::try_from(row)?;
        match contract.option_type {
            OptionType::Call => chain.calls.push(contract),
            OptionType::Put => chain.puts.push(contract),
        }
    }
    Ok(Quote::new(
        series.symbol.clone(),
        header.as_of.and_utc(),
        header.price,
        series.expiration_date,
        chain,
        header.source,
    ))
}

impl ChainRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ChainRepository { pool, writer }
    }

    fn load_series(&self, conn: &mut SqliteConnection, expiration_id: i64) -> Result<Option<ExpirationDB>> {
        expirations::table
            .find(expiration_id)
            .select(ExpirationDB::as_select())
            .first(conn)
            .optional()
            .into_core()
    }
}

#[async_trait]
impl ChainStore for ChainRepository {
    async fn append(&self, quote: &Quote) -> Result<ExpirationId> {
        let quote = quote.clone();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ExpirationId> {
                let expiration_id = find_or_create_expiration(conn, &quote)?;
                let stock_price_id = find_or_create_stock_price(conn, expiration_id, &quote)?;

                let mut inserted = 0;
                for contract in quote.chain.iter() {
                    inserted += diesel::insert_into(option_contracts::table)
                        .values(NewOptionContractDB::from_contract(stock_price_id, contract))
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .into_core()?;
                }
                debug!(
                    "Stored {} of {} contracts for {} {} at {}",
                    inserted,
                    quote.chain.len(),
                    quote.symbol,
                    quote.expiration,
                    quote.as_of
                );
                Ok(expiration_id)
            })
            .await
    }

    async fn delete_expiration(&self, expiration_id: ExpirationId) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(expirations::table.find(expiration_id))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    async fn delete_symbol(&self, symbol: &str) -> Result<usize> {
        let symbol = symbol.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(expirations::table.filter(expirations::symbol.eq(symbol)))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    fn query_range(
        &self,
        expiration_id: ExpirationId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Quote>> {
        let mut conn = get_connection(&self.pool)?;
        let Some(series) = self.load_series(&mut conn, expiration_id)? else {
            return Ok(Vec::new());
        };

        let mut headers_query = stock_prices::table
            .filter(stock_prices::expiration_id.eq(expiration_id))
            .select(StockPriceDB::as_select())
            .order(stock_prices::id.asc())
            .into_boxed();
        if let Some(start) = start {
            headers_query = headers_query.filter(stock_prices::as_of.ge(start.naive_utc()));
        }
        if let Some(end) = end {
            headers_query = headers_query.filter(stock_prices::as_of.le(end.naive_utc()));
        }
        let headers: Vec<StockPriceDB> = headers_query.load(&mut conn).into_core()?;

        let mut quotes = Vec::with_capacity(headers.len());
        for chunk in chunk_for_sqlite(&headers) {
            let rows = OptionContractDB::belonging_to(chunk)
                .select(OptionContractDB::as_select())
                .order((option_contracts::option_type.asc(), option_contracts::strike.asc()))
                .load::<OptionContractDB>(&mut conn)
                .into_core()?;
            let grouped = rows.grouped_by(chunk);
            for (header, rows) in chunk.iter().zip(grouped) {
                quotes.push(into_quote(&series, header.clone(), rows)?);
            }
        }
        Ok(quotes)
    }

    fn list_expirations(&self, symbol: Option<&str>) -> Result<Vec<Expiration>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = expirations::table
            .select(ExpirationDB::as_select())
            .order((expirations::symbol.asc(), expirations::expiration_date.asc()))
            .into_boxed();
        if let Some(symbol) = symbol {
            query = query.filter(expirations::symbol.eq(symbol.to_string()));
        }
        let rows: Vec<ExpirationDB> = query.load(&mut conn).into_core()?;
        Ok(rows.into_iter().map(Expiration::from).collect())
    }

    fn find_expiration(&self, symbol: &str, expiration: NaiveDate) -> Result<Option<Expiration>> {
        let mut conn = get_connection(&self.pool)?;
        let row = expirations::table
            .filter(expirations::symbol.eq(symbol))
            .filter(expirations::expiration_date.eq(expiration))
            .select(ExpirationDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Expiration::from))
    }

    fn get_expiration(&self, expiration_id: ExpirationId) -> Result<Option<Expiration>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(self
            .load_series(&mut conn, expiration_id)?
            .map(Expiration::from))
    }

    fn list_symbols(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        expirations::table
            .select(expirations::symbol)
            .distinct()
            .order(expirations::symbol.asc())
            .load::<String>(&mut conn)
            .into_core()
    }

    fn unique_strikes(
        &self,
        expiration_id: ExpirationId,
        option_type: OptionType,
    ) -> Result<Vec<f64>> {
        let mut conn = get_connection(&self.pool)?;
        option_contracts::table
            .inner_join(stock_prices::table)
            .filter(stock_prices::expiration_id.eq(expiration_id))
            .filter(option_contracts::option_type.eq(option_type.as_str()))
            .select(option_contracts::strike)
            .distinct()
            .order(option_contracts::strike.asc())
            .load::<f64>(&mut conn)
            .into_core()
    }
}
