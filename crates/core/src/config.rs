//! Collector configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! no file at all) is valid as long as the watchlist is filled in.

use std::path::Path;

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ATM_WINDOW_PCT, DEFAULT_COLLECTOR_LOOK_AHEAD, DEFAULT_MAX_AGE_DAYS,
    DEFAULT_MAX_CONTRACTS, DEFAULT_SCREENER_LOOK_AHEAD, DEFAULT_UPDATE_RATE_SECS,
};
use crate::errors::{ConfigError, Result};

/// Which vendor the collector talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderKind {
    #[default]
    Tradier,
    Yahoo,
}

/// One tracked underlying.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchItem {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

impl WatchItem {
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

/// Chain filter pipeline parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub max_age_days: u32,
    pub atm_window_pct: f64,
    pub max_contracts: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            atm_window_pct: DEFAULT_ATM_WINDOW_PCT,
            max_contracts: DEFAULT_MAX_CONTRACTS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub update_rate_secs: u64,
    pub collector_look_ahead: usize,
    pub screener_look_ahead: usize,
    pub provider: ProviderKind,
    /// Local start of the collection window
    pub window_start: NaiveTime,
    /// Local end of the collection window
    pub window_end: NaiveTime,
    /// IANA zone the window is expressed in
    pub window_timezone: String,
    pub excluded_days: Vec<Weekday>,
    pub filters: FilterSettings,
    pub watchlist: Vec<WatchItem>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            update_rate_secs: DEFAULT_UPDATE_RATE_SECS,
            collector_look_ahead: DEFAULT_COLLECTOR_LOOK_AHEAD,
            screener_look_ahead: DEFAULT_SCREENER_LOOK_AHEAD,
            provider: ProviderKind::default(),
            window_start: NaiveTime::from_hms_opt(6, 15, 0).unwrap_or(NaiveTime::MIN),
            window_end: NaiveTime::from_hms_opt(13, 15, 0).unwrap_or(NaiveTime::MIN),
            window_timezone: "America/Los_Angeles".to_string(),
            excluded_days: vec![Weekday::Sat, Weekday::Sun],
            filters: FilterSettings::default(),
            watchlist: Vec::new(),
        }
    }
}

impl CollectorConfig {
    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: CollectorConfig = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        debug!(
            "Loaded collector configuration from {} ({} symbols)",
            path.display(),
            config.watchlist.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.watchlist.is_empty() {
            return Err(ConfigError::MissingKey("watchlist".to_string()).into());
        }
        if let Some(item) = self.watchlist.iter().find(|w| w.symbol.trim().is_empty()) {
            return Err(invalid(format!("watchlist entry '{}' has no symbol", item.name)));
        }
        if self.update_rate_secs == 0 {
            return Err(invalid("update_rate_secs must be positive"));
        }
        if self.window_end <= self.window_start {
            return Err(invalid(format!(
                "window_end {} must be after window_start {}",
                self.window_end, self.window_start
            )));
        }
        if self.filters.max_age_days == 0 {
            return Err(invalid("filters.max_age_days must be positive"));
        }
        if !(self.filters.atm_window_pct.is_finite() && self.filters.atm_window_pct > 0.0) {
            return Err(invalid("filters.atm_window_pct must be positive"));
        }
        if self.filters.max_contracts == 0 {
            return Err(invalid("filters.max_contracts must be positive"));
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.window_timezone
            .parse::<Tz>()
            .map_err(|_| invalid(format!("unknown time zone '{}'", self.window_timezone)))
    }

    /// Whether `now` falls inside the collection window on a collecting day.
    pub fn is_collection_time(&self, now: DateTime<Utc>) -> Result<bool> {
        let local = now.with_timezone(&self.timezone()?);
        if self.excluded_days.contains(&local.weekday()) {
            return Ok(false);
        }
        let time = local.time();
        Ok(self.window_start <= time && time <= self.window_end)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.watchlist.iter().map(|w| w.symbol.as_str())
    }
}

fn invalid(message: impl Into<String>) -> crate::errors::Error {
    ConfigError::InvalidValue(message.into()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn config() -> CollectorConfig {
        CollectorConfig {
            watchlist: vec![WatchItem::new("TSLA", "Tesla"), WatchItem::new("QQQ", "Nasdaq 100")],
            ..CollectorConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let c = CollectorConfig::default();
        assert_eq!(c.update_rate_secs, 900);
        assert_eq!(c.collector_look_ahead, 3);
        assert_eq!(c.screener_look_ahead, 5);
        assert_eq!(c.provider, ProviderKind::Tradier);
        assert_eq!(c.filters.max_age_days, 10);
        assert_eq!(c.filters.atm_window_pct, 30.0);
        assert_eq!(c.filters.max_contracts, 50);
        assert_eq!(c.excluded_days, vec![Weekday::Sat, Weekday::Sun]);
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let empty = CollectorConfig::default();
        assert!(matches!(
            empty.validate(),
            Err(crate::errors::Error::Config(ConfigError::MissingKey(_)))
        ));

        let mut bad_window = config();
        bad_window.window_end = bad_window.window_start;
        assert!(bad_window.validate().is_err());

        let mut bad_zone = config();
        bad_zone.window_timezone = "Mars/Olympus".to_string();
        assert!(bad_zone.validate().is_err());

        let mut bad_filter = config();
        bad_filter.filters.max_contracts = 0;
        assert!(bad_filter.validate().is_err());
    }

    #[test]
    fn test_collection_window() {
        let c = config();
        // Wednesday 2024-03-13, 17:00 UTC = 10:00 PDT
        let inside = Utc.with_ymd_and_hms(2024, 3, 13, 17, 0, 0).unwrap();
        assert!(c.is_collection_time(inside).unwrap());

        // 12:00 UTC = 05:00 PDT, before the window
        let early = Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap();
        assert!(!c.is_collection_time(early).unwrap());

        // Saturday
        let weekend = Utc.with_ymd_and_hms(2024, 3, 16, 17, 0, 0).unwrap();
        assert!(!c.is_collection_time(weekend).unwrap());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "provider": "YAHOO",
                "collector_look_ahead": 2,
                "filters": {{"max_contracts": 40}},
                "window_start": "07:00:00",
                "watchlist": [{{"symbol": "SPY", "name": "S&P 500"}}, {{"symbol": "AMD"}}]
            }}"#
        )
        .unwrap();

        let c = CollectorConfig::load(file.path()).unwrap();
        assert_eq!(c.provider, ProviderKind::Yahoo);
        assert_eq!(c.collector_look_ahead, 2);
        assert_eq!(c.filters.max_contracts, 40);
        assert_eq!(c.filters.max_age_days, 10);
        assert_eq!(c.window_start, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(c.symbols().collect::<Vec<_>>(), vec!["SPY", "AMD"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CollectorConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, crate::errors::Error::Config(ConfigError::Io(_))));
    }
}
