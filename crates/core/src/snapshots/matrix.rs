//! Dense time x strike matrices rebuilt from chain snapshots.
//!
//! Rows are distinct observation times (first-seen order), columns are every
//! strike the series ever carried for the option type (ascending). Cells no
//! snapshot covers hold `NaN`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use optionwatch_market_data::{Contract, OptionType, Quote};

use crate::errors::{Result, ValidationError};

/// Value written into each matrix cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    Bid,
    /// Time value; calls only
    Extrinsic,
    /// Exercise value; calls only
    Intrinsic,
    ImpliedVol,
}

impl Metric {
    fn supports(&self, option_type: OptionType) -> bool {
        match self {
            Metric::Extrinsic | Metric::Intrinsic => option_type == OptionType::Call,
            Metric::Bid | Metric::ImpliedVol => true,
        }
    }

    /// Cell value for one contract given the underlying price.
    ///
    /// A 0/0 bid/ask pair is an instrumentation hiccup, not a real price, and
    /// yields `NaN` for every derived metric.
    pub fn value(&self, contract: &Contract, current_price: f64) -> f64 {
        match self {
            Metric::Bid => contract.bid.unwrap_or(f64::NAN),
            Metric::Extrinsic => {
                if contract.is_unquoted() {
                    return f64::NAN;
                }
                let bid = contract.bid.unwrap_or(f64::NAN);
                if current_price > contract.strike {
                    bid - (current_price - contract.strike)
                } else {
                    bid
                }
            }
            Metric::Intrinsic => {
                if contract.is_unquoted() {
                    return f64::NAN;
                }
                (current_price - contract.strike).max(0.0)
            }
            Metric::ImpliedVol => {
                if contract.is_unquoted() {
                    return f64::NAN;
                }
                contract.implied_volatility.unwrap_or(f64::NAN)
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotMatrix {
    pub option_type: OptionType,
    pub metric: Metric,
    pub times: Vec<DateTime<Utc>>,
    pub strikes: Vec<f64>,
    /// `values[time_index][strike_index]`
    pub values: Vec<Vec<f64>>,
}

impl SnapshotMatrix {
    pub fn get(&self, time_index: usize, strike_index: usize) -> Option<f64> {
        self.values.get(time_index)?.get(strike_index).copied()
    }

    pub fn strike_index(&self, strike: f64) -> Option<usize> {
        self.strikes.iter().position(|s| *s == strike)
    }

    /// `(time, value)` column for one strike.
    pub fn strike_series(&self, strike: f64) -> Option<Vec<(DateTime<Utc>, f64)>> {
        let column = self.strike_index(strike)?;
        Some(
            self.times
                .iter()
                .zip(&self.values)
                .map(|(time, row)| (*time, row[column]))
                .collect(),
        )
    }

    /// Finite min/max over all cells, ignoring `NaN`.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((*v, *v)),
                Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
            })
    }

    /// Cells holding a value.
    pub fn filled_cells(&self) -> usize {
        self.values.iter().flatten().filter(|v| !v.is_nan()).count()
    }
}

/// Builds a [`SnapshotMatrix`] from one expiration series.
#[derive(Clone, Debug)]
pub struct SnapshotMatrixBuilder {
    option_type: OptionType,
    metric: Metric,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl SnapshotMatrixBuilder {
    pub fn new(option_type: OptionType, metric: Metric) -> Self {
        Self {
            option_type,
            metric,
            range: None,
        }
    }

    /// Restrict rows to `start..=end`.
    pub fn with_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.range = Some((start, end));
        self
    }

    fn in_range(&self, time: DateTime<Utc>) -> bool {
        match self.range {
            Some((start, end)) => start <= time && time <= end,
            None => true,
        }
    }

    /// Build the matrix.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no snapshot falls in range or the series never carried
    /// a contract of the option type. A `Validation` error when the metric
    /// is not defined for the option type.
    pub fn build(&self, series: &[Quote]) -> Result<Option<SnapshotMatrix>> {
        if !self.metric.supports(self.option_type) {
            return Err(ValidationError::Unsupported(format!(
                "{:?} value for {} options",
                self.metric, self.option_type
            ))
            .into());
        }

        let in_range: Vec<&Quote> = series.iter().filter(|q| self.in_range(q.as_of)).collect();
        if in_range.is_empty() {
            return Ok(None);
        }

        // Columns cover the whole series so ranged views line up.
        let mut strikes: Vec<f64> = series
            .iter()
            .flat_map(|q| q.contracts(self.option_type))
            .map(|c| c.strike)
            .collect();
        strikes.sort_by(|a, b| a.total_cmp(b));
        strikes.dedup();
        if strikes.is_empty() {
            return Ok(None);
        }
        let strike_index: HashMap<u64, usize> = strikes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.to_bits(), i))
            .collect();

        let mut times: Vec<DateTime<Utc>> = Vec::new();
        let mut time_index: HashMap<DateTime<Utc>, usize> = HashMap::new();
        for quote in &in_range {
            time_index.entry(quote.as_of).or_insert_with(|| {
                times.push(quote.as_of);
                times.len() - 1
            });
        }

        let mut values = vec![vec![f64::NAN; strikes.len()]; times.len()];
        for quote in &in_range {
            let row = time_index[&quote.as_of];
            for contract in quote.contracts(self.option_type) {
                if let Some(column) = strike_index.get(&contract.strike.to_bits()) {
                    values[row][*column] = self.metric.value(contract, quote.current_price);
                }
            }
        }

        Ok(Some(SnapshotMatrix {
            option_type: self.option_type,
            metric: self.metric,
            times,
            strikes,
            values,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use optionwatch_market_data::OptionsChain;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 13, 14, 0, 0).unwrap()
    }

    fn snapshot(minutes: i64, price: f64, calls: &[(f64, f64)]) -> Quote {
        let as_of = t0() + Duration::minutes(minutes);
        let calls = calls
            .iter()
            .map(|(strike, bid)| {
                Contract::new(OptionType::Call, *strike, as_of, price).with_quote(*bid, bid + 0.2)
            })
            .collect();
        Quote::new(
            "TSLA",
            as_of,
            price,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            OptionsChain::new(calls, vec![]),
            "TEST",
        )
    }

    fn series() -> Vec<Quote> {
        vec![
            snapshot(0, 100.0, &[(95.0, 6.0), (100.0, 2.5)]),
            snapshot(15, 101.0, &[(100.0, 3.0), (105.0, 1.0)]),
            snapshot(30, 99.0, &[(95.0, 5.0), (105.0, 0.5)]),
        ]
    }

    #[test]
    fn test_bid_matrix_sparse_cells() {
        let m = SnapshotMatrixBuilder::new(OptionType::Call, Metric::Bid)
            .build(&series())
            .unwrap()
            .unwrap();

        assert_eq!(m.strikes, vec![95.0, 100.0, 105.0]);
        assert_eq!(m.times.len(), 3);

        assert_eq!(m.get(0, 0), Some(6.0));
        assert_eq!(m.get(0, 1), Some(2.5));
        assert!(m.get(0, 2).unwrap().is_nan());

        assert!(m.get(1, 0).unwrap().is_nan());
        assert_eq!(m.get(1, 1), Some(3.0));
        assert_eq!(m.get(1, 2), Some(1.0));

        assert_eq!(m.get(2, 0), Some(5.0));
        assert!(m.get(2, 1).unwrap().is_nan());
        assert_eq!(m.get(2, 2), Some(0.5));
        assert_eq!(m.filled_cells(), 6);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let builder = SnapshotMatrixBuilder::new(OptionType::Call, Metric::Bid);
        let a = builder.build(&series()).unwrap().unwrap();
        let b = builder.build(&series()).unwrap().unwrap();
        assert_eq!(a.times, b.times);
        assert_eq!(a.strikes, b.strikes);
        for (ra, rb) in a.values.iter().zip(&b.values) {
            for (x, y) in ra.iter().zip(rb) {
                assert!(x == y || (x.is_nan() && y.is_nan()));
            }
        }
    }

    #[test]
    fn test_range_keeps_full_strike_axis() {
        let m = SnapshotMatrixBuilder::new(OptionType::Call, Metric::Bid)
            .with_range(t0() + Duration::minutes(15), t0() + Duration::minutes(30))
            .build(&series())
            .unwrap()
            .unwrap();
        assert_eq!(m.times.len(), 2);
        assert_eq!(m.strikes, vec![95.0, 100.0, 105.0]);
    }

    #[test]
    fn test_no_data_in_range() {
        let out = SnapshotMatrixBuilder::new(OptionType::Call, Metric::Bid)
            .with_range(t0() + Duration::days(1), t0() + Duration::days(2))
            .build(&series())
            .unwrap();
        assert!(out.is_none());
        assert!(SnapshotMatrixBuilder::new(OptionType::Call, Metric::Bid)
            .build(&[])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_no_contracts_of_type_is_no_data() {
        let out = SnapshotMatrixBuilder::new(OptionType::Put, Metric::Bid)
            .build(&series())
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_duplicate_time_last_write_wins() {
        let mut s = series();
        s.push(snapshot(0, 100.0, &[(95.0, 7.5)]));
        let m = SnapshotMatrixBuilder::new(OptionType::Call, Metric::Bid)
            .build(&s)
            .unwrap()
            .unwrap();
        assert_eq!(m.times.len(), 3);
        assert_eq!(m.get(0, 0), Some(7.5));
        assert_eq!(m.get(0, 1), Some(2.5));
    }

    #[test]
    fn test_extrinsic_value() {
        let now = t0();
        let itm = Contract::new(OptionType::Call, 100.0, now, 110.0).with_quote(12.0, 12.5);
        assert_eq!(Metric::Extrinsic.value(&itm, 110.0), 2.0);

        let otm = Contract::new(OptionType::Call, 120.0, now, 110.0).with_quote(1.5, 1.7);
        assert_eq!(Metric::Extrinsic.value(&otm, 110.0), 1.5);

        let hiccup = Contract::new(OptionType::Call, 100.0, now, 110.0).with_quote(0.0, 0.0);
        assert!(Metric::Extrinsic.value(&hiccup, 110.0).is_nan());
        assert!(Metric::ImpliedVol.value(&hiccup, 110.0).is_nan());
        assert!(Metric::Intrinsic.value(&hiccup, 110.0).is_nan());
    }

    #[test]
    fn test_intrinsic_and_iv() {
        let now = t0();
        let mut c = Contract::new(OptionType::Call, 100.0, now, 110.0).with_quote(12.0, 12.5);
        c.implied_volatility = Some(0.35);
        assert_eq!(Metric::Intrinsic.value(&c, 110.0), 10.0);
        assert_eq!(Metric::Intrinsic.value(&c, 90.0), 0.0);
        assert_eq!(Metric::ImpliedVol.value(&c, 110.0), 0.35);

        c.implied_volatility = None;
        assert!(Metric::ImpliedVol.value(&c, 110.0).is_nan());
    }

    #[test]
    fn test_put_extrinsic_not_defined() {
        let err = SnapshotMatrixBuilder::new(OptionType::Put, Metric::Extrinsic)
            .build(&series())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::Validation(ValidationError::Unsupported(_))
        ));
    }

    #[test]
    fn test_strike_series_and_range() {
        let m = SnapshotMatrixBuilder::new(OptionType::Call, Metric::Bid)
            .build(&series())
            .unwrap()
            .unwrap();

        let column = m.strike_series(105.0).unwrap();
        assert_eq!(column.len(), 3);
        assert_eq!(column[0].0, t0());
        assert!(column[0].1.is_nan());
        assert_eq!(column[2].1, 0.5);
        assert!(m.strike_series(42.0).is_none());

        assert_eq!(m.value_range(), Some((0.5, 6.0)));
    }
}
