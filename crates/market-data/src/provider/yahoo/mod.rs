//! Yahoo Finance options data source.
//!
//! Uses the `v7/finance/options/{symbol}` endpoint with cookie/crumb
//! authentication. Yahoo only publishes implied volatility; the other greeks
//! stay `None`.
//!
//! Yahoo reports monthly expirations one day early (Thursday instead of
//! Friday). Expirations are corrected with the classifier's vendor glitch
//! mode, and chain requests map the corrected date back to Yahoo's epoch.

mod models;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::expiration::is_monthly_expiration;
use crate::models::{ChainSide, Contract, OptionType, Quote, StockPrice};
use crate::normalizer::{normalize_chain, trade_time_from_secs, ChainNormalizer};
use crate::provider::{OptionsDataSource, RateLimit};
use crate::throttle::RequestThrottle;

pub use models::{
    YahooContract, YahooOptionBlock, YahooOptionResult, YahooOptionsResponse, YahooUnderlyingQuote,
};

const PROVIDER_ID: &str = "YAHOO";
const OPTIONS_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// ============================================================================
// Normalizer
// ============================================================================

/// Maps a Yahoo option block to canonical contracts.
pub struct YahooNormalizer;

impl ChainNormalizer for YahooNormalizer {
    type Payload = YahooOptionBlock;

    fn normalize(
        &self,
        payload: &Self::Payload,
        option_type: OptionType,
        current_price: f64,
    ) -> Vec<Contract> {
        let rows = match option_type {
            OptionType::Call => &payload.calls,
            OptionType::Put => &payload.puts,
        };

        rows.iter()
            .filter_map(|row| {
                let traded_at = trade_time_from_secs(row.last_trade_date)?;
                let strike = row.strike?;

                let mut contract = Contract::new(option_type, strike, traded_at, current_price);
                contract.contract_symbol = row.contract_symbol.clone();
                contract.last_price = row.last_price;
                contract.bid = row.bid;
                contract.ask = row.ask;
                contract.change = row.change.unwrap_or(0.0);
                contract.volume = row.volume;
                contract.open_interest = row.open_interest;
                contract.implied_volatility = row.implied_volatility;
                Some(contract)
            })
            .collect()
    }
}

// ============================================================================
// Crumb/Cookie Authentication
// ============================================================================

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

// ============================================================================
// Yahoo Provider
// ============================================================================

/// Yahoo Finance options data source.
pub struct YahooProvider {
    client: Client,
    throttle: RequestThrottle,
    crumb: RwLock<Option<CrumbData>>,
}

impl YahooProvider {
    pub fn new() -> Self {
        let limit = Self::limits();
        let client = Client::builder()
            .timeout(limit.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            throttle: RequestThrottle::new(PROVIDER_ID, &limit),
            crumb: RwLock::new(None),
        }
    }

    fn limits() -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            burst: 5,
            ..RateLimit::default()
        }
    }

    fn read_crumb(&self) -> RwLockReadGuard<'_, Option<CrumbData>> {
        self.crumb.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_crumb(&self) -> RwLockWriteGuard<'_, Option<CrumbData>> {
        self.crumb.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ensure we have a valid Yahoo authentication crumb.
    async fn ensure_crumb(&self) -> Result<CrumbData, MarketDataError> {
        let cached = self.read_crumb().clone();
        match cached {
            Some(crumb) => Ok(crumb),
            None => self.fetch_crumb().await,
        }
    }

    /// Fetch a new Yahoo authentication crumb.
    async fn fetch_crumb(&self) -> Result<CrumbData, MarketDataError> {
        // Step 1: Get cookie from fc.yahoo.com
        let response = self
            .client
            .get("https://fc.yahoo.com")
            .send()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, format!("Failed to get cookie: {}", e)))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| MarketDataError::provider(PROVIDER_ID, "Failed to parse Yahoo cookie"))?;

        // Step 2: Get crumb using cookie
        let crumb = self
            .client
            .get("https://query1.finance.yahoo.com/v1/test/getcrumb")
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, format!("Failed to get crumb: {}", e)))?
            .text()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, format!("Failed to read crumb: {}", e)))?;

        let crumb_data = CrumbData { cookie, crumb };
        *self.write_crumb() = Some(crumb_data.clone());

        debug!("Fetched new Yahoo crumb");
        Ok(crumb_data)
    }

    /// Clear the cached crumb (used when authentication fails)
    fn clear_crumb(&self) {
        *self.write_crumb() = None;
    }

    /// Fetch the options document, optionally for one expiration epoch.
    async fn fetch_options(
        &self,
        symbol: &str,
        date: Option<i64>,
    ) -> Result<YahooOptionResult, MarketDataError> {
        self.throttle.acquire().await;
        let crumb = self.ensure_crumb().await?;

        let mut url = format!(
            "{}/{}?crumb={}",
            OPTIONS_URL,
            encode(symbol),
            encode(&crumb.crumb)
        );
        if let Some(epoch) = date {
            url.push_str(&format!("&date={}", epoch));
        }

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::Network(e)
                }
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                self.clear_crumb();
                return Err(MarketDataError::provider(PROVIDER_ID, "Yahoo authentication expired"));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            StatusCode::NOT_FOUND => return Err(MarketDataError::SymbolNotFound(symbol.to_string())),
            status if !status.is_success() => {
                return Err(MarketDataError::provider(PROVIDER_ID, format!("HTTP error: {}", status)));
            }
            _ => {}
        }

        let data: YahooOptionsResponse = response.json().await.map_err(|e| {
            MarketDataError::provider(PROVIDER_ID, format!("Failed to parse options response: {}", e))
        })?;

        data.option_chain
            .result
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
    }

    fn stock_price(symbol: &str, result: &YahooOptionResult) -> Result<StockPrice, MarketDataError> {
        let quote = result
            .quote
            .as_ref()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        let price = quote
            .regular_market_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| MarketDataError::ValidationFailed {
                message: format!("No valid price for {}", symbol),
            })?;

        let as_of = quote
            .regular_market_time
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now);

        Ok(StockPrice {
            symbol: symbol.to_string(),
            price,
            as_of,
        })
    }

    /// Yahoo epoch -> corrected expiration date.
    fn corrected_expiration(epoch: i64) -> Option<NaiveDate> {
        let date = DateTime::<Utc>::from_timestamp(epoch, 0)?.date_naive();
        Some(is_monthly_expiration(date, true).1)
    }

    /// Find the Yahoo epoch whose corrected date equals `expiration`.
    fn epoch_for(expiration: NaiveDate, epochs: &[i64]) -> Option<i64> {
        epochs
            .iter()
            .copied()
            .find(|epoch| Self::corrected_expiration(*epoch) == Some(expiration))
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OptionsDataSource for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        Self::limits()
    }

    async fn get_stock_price(&self, symbol: &str) -> Result<StockPrice, MarketDataError> {
        let result = self.fetch_options(symbol, None).await?;
        Self::stock_price(symbol, &result)
    }

    async fn get_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, MarketDataError> {
        let result = self.fetch_options(symbol, None).await?;
        Ok(result
            .expiration_dates
            .iter()
            .filter_map(|epoch| Self::corrected_expiration(*epoch))
            .collect())
    }

    async fn get_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        side: ChainSide,
    ) -> Result<Quote, MarketDataError> {
        let missing = || MarketDataError::NoChainForExpiration {
            symbol: symbol.to_string(),
            expiration: expiration.to_string(),
        };

        let listing = self.fetch_options(symbol, None).await?;
        let epoch = Self::epoch_for(expiration, &listing.expiration_dates).ok_or_else(missing)?;

        let result = self.fetch_options(symbol, Some(epoch)).await?;
        let stock = Self::stock_price(symbol, &result)?;
        let block = result.options.into_iter().next().ok_or_else(missing)?;

        if block.calls.is_empty() && block.puts.is_empty() {
            warn!("Yahoo returned an empty chain for {} {}", symbol, expiration);
        }

        let chain = normalize_chain(&YahooNormalizer, &block, side, stock.price);
        Ok(Quote::new(
            symbol,
            stock.as_of,
            stock.price,
            expiration,
            chain,
            PROVIDER_ID,
        ))
    }
}
