//! Tradier options data source.
//!
//! Bearer token REST API. The sandbox and production hosts share the same
//! paths, so the base URL is configurable.
//!
//! # API Endpoints
//!
//! - Underlying quote: `{base}/quotes?symbols={symbol}`
//! - Expirations: `{base}/options/expirations?symbol={symbol}`
//! - Chain: `{base}/options/chains?symbol={symbol}&expiration={date}&greeks=true`
//!
//! # Response Format
//!
//! Trade timestamps are epoch milliseconds. Single-element lists arrive as a
//! bare object, empty ones as `null`.

mod models;

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::errors::MarketDataError;
use crate::expiration::{parse_expiration, EXPIRATION_FORMAT};
use crate::models::{ChainSide, Contract, OptionType, Quote, StockPrice};
use crate::normalizer::{normalize_chain, trade_time_from_millis, ChainNormalizer};
use crate::provider::{OptionsDataSource, RateLimit};
use crate::throttle::RequestThrottle;

pub use models::{
    OneOrMany, TradierChainResponse, TradierExpirationsResponse, TradierGreeks, TradierOption,
    TradierQuotesResponse,
};

/// Sandbox host; production is `https://api.tradier.com/v1/markets`.
pub const DEFAULT_BASE_URL: &str = "https://sandbox.tradier.com/v1/markets";
const PROVIDER_ID: &str = "TRADIER";

/// Maps Tradier chain rows to canonical contracts.
pub struct TradierNormalizer;

impl ChainNormalizer for TradierNormalizer {
    type Payload = [TradierOption];

    fn normalize(
        &self,
        payload: &Self::Payload,
        option_type: OptionType,
        current_price: f64,
    ) -> Vec<Contract> {
        payload
            .iter()
            .filter(|row| row.option_type.eq_ignore_ascii_case(option_type.as_str()))
            .filter_map(|row| {
                let Some(traded_at) = trade_time_from_millis(row.trade_date) else {
                    debug!("Skipping untraded {} {:?}", option_type, row.symbol);
                    return None;
                };
                let Some(strike) = row.strike else {
                    debug!("Skipping {} row without strike {:?}", option_type, row.symbol);
                    return None;
                };

                let mut contract = Contract::new(option_type, strike, traded_at, current_price);
                contract.contract_symbol = row.symbol.clone();
                contract.last_price = row.last;
                contract.bid = row.bid;
                contract.ask = row.ask;
                contract.change = row.change.unwrap_or(0.0);
                contract.volume = row.volume;
                contract.open_interest = row.open_interest;
                if let Some(greeks) = &row.greeks {
                    contract.implied_volatility = greeks.mid_iv;
                    contract.delta = greeks.delta;
                    contract.gamma = greeks.gamma;
                    contract.theta = greeks.theta;
                    contract.vega = greeks.vega;
                }
                Some(contract)
            })
            .collect()
    }
}

/// Tradier data source.
///
/// # Example
///
/// ```ignore
/// let tradier = TradierProvider::new("token".to_string());
/// let quotes = tradier.get_monthly_chains("TSLA", ChainSide::Both, 3).await?;
/// ```
pub struct TradierProvider {
    client: Client,
    token: String,
    base_url: String,
    throttle: RequestThrottle,
    /// Last observed `X-Ratelimit-Used / X-Ratelimit-Allowed`, in percent
    utilization: RwLock<Option<f64>>,
}

impl TradierProvider {
    /// Create a provider against the sandbox host.
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(token: String, base_url: String) -> Self {
        let limit = Self::limits();
        let client = Client::builder()
            .timeout(limit.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            throttle: RequestThrottle::new(PROVIDER_ID, &limit),
            utilization: RwLock::new(None),
        }
    }

    fn limits() -> RateLimit {
        RateLimit {
            requests_per_minute: 120,
            burst: 10,
            ..RateLimit::default()
        }
    }

    /// Rate limit utilization reported by the last response, in percent.
    pub fn utilization_pct(&self) -> Option<f64> {
        self.utilization.read().map(|g| *g).unwrap_or(None)
    }

    fn record_utilization(&self, headers: &HeaderMap) {
        let read = |name: &str| -> Option<f64> {
            headers.get(name)?.to_str().ok()?.trim().parse::<f64>().ok()
        };

        if let (Some(used), Some(allowed)) = (read("X-Ratelimit-Used"), read("X-Ratelimit-Allowed"))
        {
            if allowed > 0.0 {
                let pct = used / allowed * 100.0;
                debug!("Tradier rate limit utilization {:.1}%", pct);
                if let Ok(mut guard) = self.utilization.write() {
                    *guard = Some(pct);
                }
            }
        }
    }

    /// GET `{base}/{path}` with bearer auth and decode the JSON body.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        self.throttle.acquire().await;

        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
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

        self.record_utilization(response.headers());

        // Check for rate limiting
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !response.status().is_success() {
            return Err(MarketDataError::provider(
                PROVIDER_ID,
                format!("HTTP error: {} ({})", response.status(), path),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            MarketDataError::provider(PROVIDER_ID, format!("Failed to parse {}: {}", path, e))
        })
    }

    fn parse_stock_price(
        symbol: &str,
        response: TradierQuotesResponse,
    ) -> Result<StockPrice, MarketDataError> {
        let quote = response
            .quotes
            .and_then(|q| q.quote)
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        let price = quote
            .last
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| MarketDataError::ValidationFailed {
                message: format!("No last price for {}", symbol),
            })?;

        let as_of = trade_time_from_millis(quote.trade_date).ok_or_else(|| {
            MarketDataError::ValidationFailed {
                message: format!("Invalid trade date for {}: {:?}", symbol, quote.trade_date),
            }
        })?;

        Ok(StockPrice {
            symbol: quote.symbol,
            price,
            as_of,
        })
    }

    fn parse_expirations(response: TradierExpirationsResponse) -> Vec<NaiveDate> {
        response
            .expirations
            .and_then(|e| e.date)
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .iter()
            .filter_map(|raw| match parse_expiration(raw) {
                Ok(date) => Some(date),
                Err(e) => {
                    warn!("{}: {}", PROVIDER_ID, e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl OptionsDataSource for TradierProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        Self::limits()
    }

    async fn get_stock_price(&self, symbol: &str) -> Result<StockPrice, MarketDataError> {
        let response: TradierQuotesResponse = self.fetch("quotes", &[("symbols", symbol)]).await?;
        Self::parse_stock_price(symbol, response)
    }

    async fn get_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, MarketDataError> {
        let response: TradierExpirationsResponse = self
            .fetch("options/expirations", &[("symbol", symbol)])
            .await?;
        Ok(Self::parse_expirations(response))
    }

    async fn get_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        side: ChainSide,
    ) -> Result<Quote, MarketDataError> {
        let stock = self.get_stock_price(symbol).await?;

        let expiration_str = expiration.format(EXPIRATION_FORMAT).to_string();
        let response: TradierChainResponse = self
            .fetch(
                "options/chains",
                &[
                    ("symbol", symbol),
                    ("expiration", expiration_str.as_str()),
                    ("greeks", "true"),
                ],
            )
            .await?;

        let rows = response
            .options
            .and_then(|o| o.option)
            .ok_or_else(|| MarketDataError::NoChainForExpiration {
                symbol: symbol.to_string(),
                expiration: expiration_str.clone(),
            })?;

        let chain = normalize_chain(&TradierNormalizer, &rows, side, stock.price);
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
