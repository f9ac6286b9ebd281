//! Environment configuration for the collector binary.

use std::path::PathBuf;

use anyhow::{bail, Context};

use optionwatch_core::config::{CollectorConfig, ProviderKind, WatchItem};
use optionwatch_market_data::provider::tradier::DEFAULT_BASE_URL;

const DEFAULT_DB_PATH: &str = "./db/options.db";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectMode {
    /// One pass over the watchlist, then exit
    Once,
    /// Collect every update period inside the trading window
    Repeat,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: String,
    pub config_path: Option<PathBuf>,
    pub tradier_token: Option<String>,
    pub tradier_base_url: String,
    pub mode: CollectMode,
    /// Comma-separated symbols used when no configuration file is given
    pub watchlist: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = match non_empty("OW_COLLECT_MODE").as_deref().map(str::to_ascii_lowercase) {
            None => CollectMode::Once,
            Some(m) if m == "once" => CollectMode::Once,
            Some(m) if m == "repeat" => CollectMode::Repeat,
            Some(other) => bail!("OW_COLLECT_MODE must be 'once' or 'repeat', got '{}'", other),
        };

        Ok(Self {
            db_path: non_empty("OW_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            config_path: non_empty("OW_CONFIG_PATH").map(PathBuf::from),
            tradier_token: non_empty("OW_TRADIER_TOKEN"),
            tradier_base_url: non_empty("OW_TRADIER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            mode,
            watchlist: non_empty("OW_WATCHLIST")
                .map(|list| {
                    list.split(',')
                        .map(|s| s.trim().to_uppercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Collector settings from the configuration file, or defaults plus the
    /// `OW_WATCHLIST` symbols.
    pub fn collector_config(&self) -> anyhow::Result<CollectorConfig> {
        let config = match &self.config_path {
            Some(path) => CollectorConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => {
                let config = CollectorConfig {
                    watchlist: self.watchlist.iter().map(|s| WatchItem::new(s, s)).collect(),
                    ..CollectorConfig::default()
                };
                config.validate().context("set OW_CONFIG_PATH or OW_WATCHLIST")?;
                config
            }
        };
        if config.provider == ProviderKind::Tradier && self.tradier_token.is_none() {
            bail!("OW_TRADIER_TOKEN is required for the TRADIER provider");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, "./db/options.db");
        assert_eq!(config.mode, CollectMode::Once);
        assert_eq!(config.tradier_base_url, DEFAULT_BASE_URL);
        assert!(config.config_path.is_none());
        assert!(config.watchlist.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OW_DB_PATH", "/data/options.db"),
            ("OW_COLLECT_MODE", "Repeat"),
            ("OW_TRADIER_TOKEN", "abc"),
            ("OW_WATCHLIST", "tsla, qqq,,"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, "/data/options.db");
        assert_eq!(config.mode, CollectMode::Repeat);
        assert_eq!(config.watchlist, vec!["TSLA".to_string(), "QQQ".to_string()]);

        let collector = config.collector_config().unwrap();
        assert_eq!(collector.watchlist.len(), 2);
    }

    #[test]
    fn test_rejects_bad_mode() {
        assert!(Config::from_lookup(lookup(&[("OW_COLLECT_MODE", "forever")])).is_err());
    }

    #[test]
    fn test_tradier_needs_token() {
        let config = Config::from_lookup(lookup(&[("OW_WATCHLIST", "TSLA")])).unwrap();
        assert!(config.collector_config().is_err());
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.json");
        std::fs::write(
            &path,
            r#"{"provider": "YAHOO", "watchlist": [{"symbol": "SPY", "name": "S&P 500"}]}"#,
        )
        .unwrap();

        let config = Config::from_lookup(lookup(&[(
            "OW_CONFIG_PATH",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        let collector = config.collector_config().unwrap();
        assert_eq!(collector.provider, ProviderKind::Yahoo);
        assert_eq!(collector.watchlist[0].symbol, "SPY");
    }
}
