use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;

use optionwatch_market_data::{ChainSide, OptionsDataSource, Quote, EXPIRATION_FORMAT};

use crate::chains::{ChainStore, ExpirationId, FilterPipeline};
use crate::config::CollectorConfig;
use crate::errors::Result;

/// Outcome of one pass over the watchlist.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CollectionReport {
    pub snapshots_stored: usize,
    pub symbols_collected: Vec<String>,
    /// `(symbol, error message)` for every symbol that failed
    pub failures: Vec<(String, String)>,
}

impl CollectionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetches, filters and stores monthly chains for the watchlist.
pub struct CollectorService {
    source: Arc<dyn OptionsDataSource>,
    store: Arc<dyn ChainStore>,
    config: CollectorConfig,
}

fn log_counts(stage: &str, quote: &Quote) {
    info!(
        "{}({}). Expires {}. {} Calls, {} Puts",
        quote.symbol,
        stage,
        quote.expiration.format(EXPIRATION_FORMAT),
        quote.chain.calls.len(),
        quote.chain.puts.len()
    );
}

impl CollectorService {
    pub fn new(
        source: Arc<dyn OptionsDataSource>,
        store: Arc<dyn ChainStore>,
        config: CollectorConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Collect every monthly expiration in the look-ahead for one symbol.
    ///
    /// # Returns
    ///
    /// Ids of the series that received a snapshot, in expiration order
    pub async fn collect_symbol(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpirationId>> {
        let quotes = self
            .source
            .get_monthly_chains(symbol, ChainSide::Both, self.config.collector_look_ahead)
            .await?;

        let pipeline = FilterPipeline::collector_default(&self.config.filters, now);
        let mut stored = Vec::with_capacity(quotes.len());
        for mut quote in quotes {
            log_counts("Before filter", &quote);
            quote.chain = pipeline.apply(quote.chain, quote.current_price);
            log_counts("After filter", &quote);

            stored.push(self.store.append(&quote).await?);
        }
        Ok(stored)
    }

    /// One pass over the watchlist. A failing symbol is logged and reported
    /// without stopping the others.
    pub async fn collect_all(&self, now: DateTime<Utc>) -> CollectionReport {
        let mut report = CollectionReport::default();
        for symbol in self.config.symbols() {
            match self.collect_symbol(symbol, now).await {
                Ok(ids) => {
                    report.snapshots_stored += ids.len();
                    report.symbols_collected.push(symbol.to_string());
                }
                Err(e) => {
                    error!("Collection failed for {}: {}", symbol, e);
                    report.failures.push((symbol.to_string(), e.to_string()));
                }
            }
        }
        info!(
            "Collected {} snapshots for {} symbols ({} failed) from {}",
            report.snapshots_stored,
            report.symbols_collected.len(),
            report.failures.len(),
            self.source.id()
        );
        report
    }
}
