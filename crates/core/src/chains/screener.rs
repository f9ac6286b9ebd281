//! Covered-call screener.
//!
//! For each monthly expiration in the look-ahead, picks the call closest to
//! the target out-of-the-money percentage and reports its yield.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use optionwatch_market_data::{
    enumerate_next_n_monthly_expirations, ChainSide, MarketDataError, OptionType,
    OptionsDataSource, Quote,
};

use super::selector::BestStrikeSelector;
use crate::constants::DAYS_PER_YEAR;
use crate::errors::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRow {
    pub symbol: String,
    pub expiration: NaiveDate,
    pub stock_price: f64,
    pub strike: f64,
    pub otm_pct: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    /// `bid / price * 100`
    pub roi_pct: f64,
    /// `365 / (days_to_expiration + 1) * roi_pct`
    pub annual_roi_pct: f64,
    pub implied_vol_pct: Option<f64>,
    pub delta: Option<f64>,
    pub theta: Option<f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct Screener {
    selector: BestStrikeSelector,
    look_ahead: usize,
}

impl Screener {
    pub fn new(target_otm_pct: f64, look_ahead: usize) -> Self {
        Self {
            selector: BestStrikeSelector::new(target_otm_pct),
            look_ahead,
        }
    }

    /// Monthly expirations to screen, starting today.
    pub fn expirations(&self, today: NaiveDate) -> Vec<NaiveDate> {
        enumerate_next_n_monthly_expirations(today, self.look_ahead)
    }

    /// Screen one chain snapshot. `None` when no call qualifies.
    pub fn evaluate(&self, quote: &Quote, today: NaiveDate) -> Option<ScreenerRow> {
        let calls = quote.contracts(OptionType::Call);
        let picked = self.selector.select(calls, quote.current_price)?;
        let contract = &calls[picked.index];

        let roi_pct = round2(contract.bid.unwrap_or(0.0) / quote.current_price * 100.0);
        let days = (quote.expiration - today).num_days().max(0);
        let annual_roi_pct = round2(DAYS_PER_YEAR / (days + 1) as f64 * roi_pct);

        Some(ScreenerRow {
            symbol: quote.symbol.clone(),
            expiration: quote.expiration,
            stock_price: quote.current_price,
            strike: contract.strike,
            otm_pct: round2(picked.otm_pct),
            bid: contract.bid,
            ask: contract.ask,
            roi_pct,
            annual_roi_pct,
            implied_vol_pct: contract.implied_volatility.map(|iv| round2(iv * 100.0)),
            delta: contract.delta,
            theta: contract.theta,
        })
    }

    /// Fetch and screen every symbol.
    ///
    /// Expirations the vendor has no chain for are skipped; any other vendor
    /// failure aborts that symbol only.
    pub async fn screen(
        &self,
        source: &dyn OptionsDataSource,
        symbols: &[String],
        today: NaiveDate,
    ) -> Result<Vec<ScreenerRow>> {
        let expirations = self.expirations(today);
        let mut rows = Vec::new();

        for symbol in symbols {
            for expiration in &expirations {
                match source.get_chain(symbol, *expiration, ChainSide::Calls).await {
                    Ok(quote) => match self.evaluate(&quote, today) {
                        Some(row) => rows.push(row),
                        None => debug!("No qualifying strike for {} {}", symbol, expiration),
                    },
                    Err(MarketDataError::NoChainForExpiration { .. }) => {
                        debug!("No chain for {} {}", symbol, expiration);
                    }
                    Err(e) => {
                        warn!("Screening {} failed: {}", symbol, e);
                        break;
                    }
                }
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use optionwatch_market_data::{Contract, OptionsChain};

    fn quote() -> Quote {
        let now = Utc::now();
        let mut calls: Vec<Contract> = [95.0, 100.0, 105.0, 110.0]
            .iter()
            .map(|s| Contract::new(OptionType::Call, *s, now, 100.0).with_quote(s / 50.0, s / 50.0 + 0.1))
            .collect();
        calls[2].implied_volatility = Some(0.4567);
        calls[2].delta = Some(0.31);
        Quote::new(
            "AMD",
            now,
            100.0,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            OptionsChain::new(calls, vec![]),
            "TEST",
        )
    }

    #[test]
    fn test_expirations() {
        let screener = Screener::new(5.0, 2);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            screener.expirations(today),
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 19).unwrap()
            ]
        );
    }

    #[test]
    fn test_evaluate_row() {
        let screener = Screener::new(5.0, 5);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let row = screener.evaluate(&quote(), today).unwrap();

        assert_eq!(row.strike, 105.0);
        assert_eq!(row.otm_pct, 5.0);
        assert_eq!(row.bid, Some(2.1));
        assert_eq!(row.roi_pct, 2.1);
        // 14 days to expiration -> 365 / 15 * 2.1
        assert_eq!(row.annual_roi_pct, 51.1);
        assert_eq!(row.implied_vol_pct, Some(45.67));
        assert_eq!(row.delta, Some(0.31));
        assert!(row.theta.is_none());
    }

    #[test]
    fn test_evaluate_empty_chain() {
        let mut q = quote();
        q.chain = OptionsChain::default();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(Screener::new(5.0, 5).evaluate(&q, today).is_none());
    }
}
