//! The options data source trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};

use crate::errors::MarketDataError;
use crate::expiration::is_monthly_expiration;
use crate::models::{ChainSide, Quote, StockPrice};
use crate::provider::RateLimit;

/// Trait for options chain vendors.
///
/// Implementations handle the specifics of talking to one vendor (auth,
/// endpoints, payload shapes) and hand back canonical [`Quote`]s. Nothing
/// above this trait branches on vendor identity.
#[async_trait]
pub trait OptionsDataSource: Send + Sync {
    /// Unique identifier for this data source, e.g. "TRADIER", "YAHOO".
    fn id(&self) -> &'static str;

    /// Rate limit configuration the source throttles itself with.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Latest underlying price.
    async fn get_stock_price(&self, symbol: &str) -> Result<StockPrice, MarketDataError>;

    /// Expirations the vendor lists for `symbol`.
    ///
    /// Dates are already corrected for any vendor-specific encoding quirk.
    async fn get_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, MarketDataError>;

    /// Normalized chain for one expiration.
    ///
    /// Returns [`MarketDataError::NoChainForExpiration`] when the vendor has
    /// nothing for that date.
    async fn get_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        side: ChainSide,
    ) -> Result<Quote, MarketDataError>;

    /// Chains for the next `look_ahead` monthly expirations the vendor lists.
    ///
    /// Every monthly expiration consumes one look-ahead slot, whether or not
    /// the vendor actually returns a chain for it. Missing chains are logged
    /// and skipped; other errors abort.
    async fn get_monthly_chains(
        &self,
        symbol: &str,
        side: ChainSide,
        look_ahead: usize,
    ) -> Result<Vec<Quote>, MarketDataError> {
        let mut expirations = self.get_expirations(symbol).await?;
        expirations.sort();
        expirations.dedup();

        let mut remaining = look_ahead;
        let mut quotes = Vec::new();

        for expiration in expirations {
            if remaining == 0 {
                break;
            }
            if !is_monthly_expiration(expiration, false).0 {
                continue;
            }
            remaining -= 1;

            match self.get_chain(symbol, expiration, side).await {
                Ok(quote) => {
                    debug!(
                        "{}: fetched {} contracts for {} expiring {}",
                        self.id(),
                        quote.chain.len(),
                        symbol,
                        expiration
                    );
                    quotes.push(quote);
                }
                Err(MarketDataError::NoChainForExpiration { .. }) => {
                    warn!("No options for {}. Expires {}", symbol, expiration);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    use crate::models::OptionsChain;

    struct FakeSource {
        expirations: Vec<NaiveDate>,
        missing: Vec<NaiveDate>,
        requested: Mutex<Vec<NaiveDate>>,
    }

    #[async_trait]
    impl OptionsDataSource for FakeSource {
        fn id(&self) -> &'static str {
            "FAKE"
        }

        async fn get_stock_price(&self, symbol: &str) -> Result<StockPrice, MarketDataError> {
            Ok(StockPrice {
                symbol: symbol.to_string(),
                price: 100.0,
                as_of: Utc::now(),
            })
        }

        async fn get_expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>, MarketDataError> {
            Ok(self.expirations.clone())
        }

        async fn get_chain(
            &self,
            symbol: &str,
            expiration: NaiveDate,
            _side: ChainSide,
        ) -> Result<Quote, MarketDataError> {
            self.requested.lock().unwrap().push(expiration);
            if self.missing.contains(&expiration) {
                return Err(MarketDataError::NoChainForExpiration {
                    symbol: symbol.to_string(),
                    expiration: expiration.to_string(),
                });
            }
            Ok(Quote::new(symbol, Utc::now(), 100.0, expiration, OptionsChain::default(), "FAKE"))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_monthly_chains_skip_weeklies_and_stop_at_look_ahead() {
        let source = FakeSource {
            expirations: vec![
                date(2024, 4, 19),
                date(2024, 3, 8),
                date(2024, 3, 15),
                date(2024, 3, 22),
                date(2024, 5, 17),
            ],
            missing: vec![],
            requested: Mutex::new(vec![]),
        };

        let quotes = source.get_monthly_chains("SPY", ChainSide::Both, 2).await.unwrap();
        let got: Vec<NaiveDate> = quotes.iter().map(|q| q.expiration).collect();
        assert_eq!(got, vec![date(2024, 3, 15), date(2024, 4, 19)]);
    }

    #[tokio::test]
    async fn test_missing_chain_consumes_look_ahead_slot() {
        let source = FakeSource {
            expirations: vec![date(2024, 3, 15), date(2024, 4, 19), date(2024, 5, 17)],
            missing: vec![date(2024, 3, 15)],
            requested: Mutex::new(vec![]),
        };

        let quotes = source.get_monthly_chains("SPY", ChainSide::Calls, 2).await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].expiration, date(2024, 4, 19));
        assert_eq!(
            *source.requested.lock().unwrap(),
            vec![date(2024, 3, 15), date(2024, 4, 19)]
        );
    }

    #[tokio::test]
    async fn test_no_expirations_yields_empty() {
        let source = FakeSource {
            expirations: vec![],
            missing: vec![],
            requested: Mutex::new(vec![]),
        };
        assert!(source.get_monthly_chains("SPY", ChainSide::Both, 3).await.unwrap().is_empty());
    }
}
