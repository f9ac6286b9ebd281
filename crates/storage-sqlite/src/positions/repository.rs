use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use optionwatch_core::errors::{DatabaseError, ValidationError};
use optionwatch_core::positions::{NewPosition, Position, PositionStore, PositionUpdate};
use optionwatch_core::Result;

use super::model::PositionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{expirations, positions};

pub struct PositionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

fn load_position(conn: &mut SqliteConnection, position_id: &str) -> Result<Option<Position>> {
    let row = positions::table
        .inner_join(expirations::table)
        .filter(positions::id.eq(position_id))
        .select((PositionDB::as_select(), expirations::expiration_date))
        .first::<(PositionDB, NaiveDate)>(conn)
        .optional()
        .into_core()?;
    match row {
        Some((db, expiration)) => Ok(Some(db.into_domain(expiration)?)),
        None => Ok(None),
    }
}

impl PositionRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        PositionRepository { pool, writer }
    }
}

#[async_trait]
impl PositionStore for PositionRepository {
    async fn add(&self, position: NewPosition) -> Result<Position> {
        position.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Position> {
                let series_symbol = expirations::table
                    .find(position.expiration_id)
                    .select(expirations::symbol)
                    .first::<String>(conn)
                    .optional()
                    .into_core()?
                    .ok_or_else(|| {
                        DatabaseError::NotFound(format!("Expiration {}", position.expiration_id))
                    })?;
                if !series_symbol.eq_ignore_ascii_case(position.symbol.trim()) {
                    return Err(ValidationError::InvalidInput(format!(
                        "Position symbol {} does not match expiration series {}",
                        position.symbol, series_symbol
                    ))
                    .into());
                }

                let id = Uuid::new_v4().to_string();
                let row = PositionDB::from_new(id.clone(), position, Utc::now().naive_utc());
                diesel::insert_into(positions::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                load_position(conn, &id)?
                    .ok_or_else(|| DatabaseError::NotFound(format!("Position {}", id)).into())
            })
            .await
    }

    async fn update(&self, position_id: &str, update: PositionUpdate) -> Result<Position> {
        let position_id = position_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Position> {
                let current = load_position(conn, &position_id)?.ok_or_else(|| {
                    DatabaseError::NotFound(format!("Position {}", position_id))
                })?;
                update.validate(&current)?;

                let mut row = positions::table
                    .find(position_id.as_str())
                    .select(PositionDB::as_select())
                    .first::<PositionDB>(conn)
                    .into_core()?;
                if let Some(open_price) = update.open_price {
                    row.open_price = open_price.to_string();
                }
                if update.close_date.is_some() {
                    row.close_date = update.close_date;
                    row.close_price = update.close_price.map(|d| d.to_string());
                }
                if let Some(stock_price_close) = update.stock_price_close {
                    row.stock_price_close = Some(stock_price_close.to_string());
                }
                row.updated_at = Utc::now().naive_utc();

                diesel::update(positions::table.find(position_id.as_str()))
                    .set(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(row.into_domain(current.expiration)?)
            })
            .await
    }

    async fn delete(&self, position_id: &str) -> Result<usize> {
        let position_id = position_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(positions::table.find(position_id))
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    fn get(&self, position_id: &str) -> Result<Option<Position>> {
        let mut conn = get_connection(&self.pool)?;
        load_position(&mut conn, position_id)
    }

    fn list(&self, symbol: Option<&str>) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = positions::table
            .inner_join(expirations::table)
            .select((PositionDB::as_select(), expirations::expiration_date))
            .order((positions::open_date.desc(), positions::created_at.desc()))
            .into_boxed();
        if let Some(symbol) = symbol {
            query = query.filter(positions::symbol.eq(symbol.to_uppercase()));
        }
        let rows: Vec<(PositionDB, NaiveDate)> = query.load(&mut conn).into_core()?;
        rows.into_iter()
            .map(|(db, expiration)| db.into_domain(expiration).map_err(Into::into))
            .collect()
    }
}
