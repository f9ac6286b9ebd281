//! Vendor payload to canonical [`Contract`] conversion.
//!
//! Each data source owns one [`ChainNormalizer`] for its raw row shape.
//! Everything downstream (filters, persistence, matrix building) only ever
//! sees the canonical output, which [`finalize`] guarantees is:
//! - free of rows with a non-finite or non-positive strike
//! - sorted by ascending strike
//! - unique per strike (first occurrence wins)

use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{ChainSide, Contract, OptionType, OptionsChain};

/// Maps one vendor's raw chain payload to canonical contracts.
pub trait ChainNormalizer {
    /// Raw vendor shape
    type Payload: ?Sized;

    /// Convert every usable row of `option_type` into a [`Contract`].
    ///
    /// Rows without a positive trade timestamp are skipped. Implementations
    /// do not need to sort or deduplicate; callers run [`finalize`].
    fn normalize(
        &self,
        payload: &Self::Payload,
        option_type: OptionType,
        current_price: f64,
    ) -> Vec<Contract>;
}

/// Normalize the requested side(s) of a payload into a chain.
pub fn normalize_chain<N: ChainNormalizer>(
    normalizer: &N,
    payload: &N::Payload,
    side: ChainSide,
    current_price: f64,
) -> OptionsChain {
    let mut chain = OptionsChain::default();
    if side.includes(OptionType::Call) {
        chain.calls = finalize(normalizer.normalize(payload, OptionType::Call, current_price));
    }
    if side.includes(OptionType::Put) {
        chain.puts = finalize(normalizer.normalize(payload, OptionType::Put, current_price));
    }
    chain
}

/// Drop malformed rows, sort by strike and keep the first row per strike.
pub fn finalize(contracts: Vec<Contract>) -> Vec<Contract> {
    let mut kept: Vec<Contract> = contracts
        .into_iter()
        .filter(|c| {
            let ok = c.strike.is_finite() && c.strike > 0.0;
            if !ok {
                debug!("Dropping {} contract with invalid strike {}", c.option_type, c.strike);
            }
            ok
        })
        .collect();

    // stable sort keeps vendor order among equal strikes
    kept.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    kept.dedup_by(|later, earlier| later.strike == earlier.strike);
    kept
}

/// Trade timestamp in epoch milliseconds; `None` unless strictly positive.
pub fn trade_time_from_millis(millis: Option<i64>) -> Option<DateTime<Utc>> {
    match millis {
        Some(ms) if ms > 0 => Utc.timestamp_opt(ms / 1000, 0).single(),
        _ => None,
    }
}

/// Trade timestamp in epoch seconds; `None` unless strictly positive.
pub fn trade_time_from_secs(secs: Option<i64>) -> Option<DateTime<Utc>> {
    match secs {
        Some(s) if s > 0 => Utc.timestamp_opt(s, 0).single(),
        _ => None,
    }
}

/// Decode vendor rows one at a time, dropping the ones that do not fit `T`.
///
/// A wrongly typed field in one row must not cost the rest of the chain.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!("Skipping malformed chain row: {}", e);
                None
            }
        })
        .collect()
}

/// Rows from a value that may be a list, a single object or `null`.
pub fn decode_one_or_many<T: DeserializeOwned>(value: Value) -> Option<Vec<T>> {
    match value {
        Value::Null => None,
        Value::Array(rows) => Some(decode_rows(rows)),
        row => Some(decode_rows(vec![row])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(strike: f64, bid: f64) -> Contract {
        Contract::new(OptionType::Call, strike, Utc::now(), 100.0).with_quote(bid, bid + 0.1)
    }

    #[test]
    fn test_finalize_sorts_and_dedups() {
        let out = finalize(vec![call(105.0, 1.0), call(95.0, 6.0), call(105.0, 9.9), call(100.0, 3.0)]);
        let strikes: Vec<f64> = out.iter().map(|c| c.strike).collect();
        assert_eq!(strikes, vec![95.0, 100.0, 105.0]);
        // first 105 strike kept
        assert_eq!(out[2].bid, Some(1.0));
    }

    #[test]
    fn test_finalize_drops_malformed_strikes() {
        let out = finalize(vec![call(f64::NAN, 1.0), call(-5.0, 1.0), call(0.0, 1.0), call(100.0, 1.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].strike, 100.0);
    }

    #[test]
    fn test_trade_time_conversion() {
        assert!(trade_time_from_millis(None).is_none());
        assert!(trade_time_from_millis(Some(0)).is_none());
        assert!(trade_time_from_millis(Some(-1)).is_none());
        let t = trade_time_from_millis(Some(1_710_500_000_123)).unwrap();
        assert_eq!(t.timestamp(), 1_710_500_000);

        assert!(trade_time_from_secs(Some(0)).is_none());
        assert_eq!(trade_time_from_secs(Some(1_710_500_000)).unwrap().timestamp(), 1_710_500_000);
    }

    struct VecNormalizer;

    impl ChainNormalizer for VecNormalizer {
        type Payload = [(OptionType, f64)];

        fn normalize(&self, payload: &Self::Payload, option_type: OptionType, price: f64) -> Vec<Contract> {
            payload
                .iter()
                .filter(|(t, _)| *t == option_type)
                .map(|(t, s)| Contract::new(*t, *s, Utc::now(), price))
                .collect()
        }
    }

    #[test]
    fn test_normalize_chain_respects_side() {
        let payload = [(OptionType::Put, 90.0), (OptionType::Call, 110.0), (OptionType::Call, 100.0)];

        let both = normalize_chain(&VecNormalizer, &payload[..], ChainSide::Both, 100.0);
        assert_eq!(both.calls.len(), 2);
        assert_eq!(both.puts.len(), 1);
        assert_eq!(both.calls[0].strike, 100.0);

        let calls = normalize_chain(&VecNormalizer, &payload[..], ChainSide::Calls, 100.0);
        assert_eq!(calls.calls.len(), 2);
        assert!(calls.puts.is_empty());
    }

    #[derive(Debug, serde::Deserialize)]
    struct Row {
        strike: f64,
        volume: Option<u64>,
    }

    #[test]
    fn test_decode_rows_drops_only_bad_rows() {
        let rows = serde_json::json!([
            {"strike": 100.0, "volume": 10},
            {"strike": 105.0, "volume": 12.5},
            {"strike": "110"},
            {"strike": 115.0}
        ]);
        let Value::Array(rows) = rows else { unreachable!() };
        let decoded: Vec<Row> = decode_rows(rows);
        let strikes: Vec<f64> = decoded.iter().map(|r| r.strike).collect();
        assert_eq!(strikes, vec![100.0, 115.0]);
        assert_eq!(decoded[0].volume, Some(10));
    }

    #[test]
    fn test_decode_one_or_many() {
        assert!(decode_one_or_many::<Row>(Value::Null).is_none());

        let single: Vec<Row> = decode_one_or_many(serde_json::json!({"strike": 50.0})).unwrap();
        assert_eq!(single.len(), 1);

        let bad_single: Vec<Row> = decode_one_or_many(serde_json::json!({"strike": null})).unwrap();
        assert!(bad_single.is_empty());
    }
}
