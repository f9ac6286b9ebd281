//! Chain filters.
//!
//! Each filter works on one side (calls or puts) of a chain and is applied to
//! both sides independently. Filters never fail: malformed or degenerate
//! input makes them a no-op, and an empty output is a valid outcome.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use optionwatch_market_data::{Contract, OptionsChain};

use crate::config::FilterSettings;

/// A single chain filter stage.
pub trait ChainFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Filter one side of a chain.
    fn apply(&self, contracts: Vec<Contract>, current_price: f64) -> Vec<Contract>;

    /// Filter calls and puts independently.
    fn apply_chain(&self, chain: OptionsChain, current_price: f64) -> OptionsChain {
        OptionsChain {
            calls: self.apply(chain.calls, current_price),
            puts: self.apply(chain.puts, current_price),
        }
    }
}

// ============================================================================
// Staleness
// ============================================================================

/// Drops contracts whose last trade is `max_age_days` or more before `now`.
#[derive(Clone, Debug)]
pub struct StalenessFilter {
    max_age_days: u32,
    now: DateTime<Utc>,
}

impl StalenessFilter {
    pub fn new(max_age_days: u32, now: DateTime<Utc>) -> Self {
        Self { max_age_days, now }
    }

    fn cutoff(&self) -> DateTime<Utc> {
        self.now - Duration::days(i64::from(self.max_age_days))
    }
}

impl ChainFilter for StalenessFilter {
    fn name(&self) -> &'static str {
        "staleness"
    }

    fn apply(&self, contracts: Vec<Contract>, _current_price: f64) -> Vec<Contract> {
        let cutoff = self.cutoff();
        contracts
            .into_iter()
            .filter(|c| c.last_trade_time > cutoff)
            .collect()
    }
}

// ============================================================================
// At-the-money window
// ============================================================================

/// Keeps strikes strictly inside `price * (1 ± pct/100)` once a side holds
/// more than `max_contracts` entries.
#[derive(Clone, Debug)]
pub struct MoneynessWindowFilter {
    pct: f64,
    max_contracts: usize,
}

impl MoneynessWindowFilter {
    pub fn new(pct: f64, max_contracts: usize) -> Self {
        Self { pct, max_contracts }
    }
}

impl ChainFilter for MoneynessWindowFilter {
    fn name(&self) -> &'static str {
        "moneyness_window"
    }

    fn apply(&self, contracts: Vec<Contract>, current_price: f64) -> Vec<Contract> {
        if contracts.len() <= self.max_contracts {
            return contracts;
        }
        if !(current_price.is_finite() && current_price > 0.0 && self.pct.is_finite()) {
            debug!("Skipping moneyness window for price {}", current_price);
            return contracts;
        }

        let low = current_price * (1.0 - self.pct / 100.0);
        let high = current_price * (1.0 + self.pct / 100.0);
        contracts
            .into_iter()
            .filter(|c| c.strike > low && c.strike < high)
            .collect()
    }
}

// ============================================================================
// Decimation
// ============================================================================

/// Thins a long strike ladder, preferring round strikes.
///
/// Active only when the side holds more than `max_contracts` entries and
/// `floor(len / max_contracts) > 1`. A strike survives when it is a multiple
/// of 5 (which covers multiples of 10) or of
/// `ceil((max_strike - min_strike) / max_contracts)`.
#[derive(Clone, Debug)]
pub struct DecimationFilter {
    max_contracts: usize,
}

impl DecimationFilter {
    pub fn new(max_contracts: usize) -> Self {
        Self { max_contracts }
    }

    fn decimate_factor(&self, contracts: &[Contract]) -> Option<f64> {
        let (min, max) = contracts.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            (lo.min(c.strike), hi.max(c.strike))
        });
        let factor = ((max - min) / self.max_contracts as f64).ceil();
        (factor.is_finite() && factor > 0.0).then_some(factor)
    }
}

fn is_multiple_of(value: f64, step: f64) -> bool {
    value % step == 0.0
}

impl ChainFilter for DecimationFilter {
    fn name(&self) -> &'static str {
        "decimation"
    }

    fn apply(&self, contracts: Vec<Contract>, _current_price: f64) -> Vec<Contract> {
        if self.max_contracts == 0 || contracts.len() <= self.max_contracts {
            return contracts;
        }
        if contracts.len() / self.max_contracts <= 1 {
            return contracts;
        }
        let Some(factor) = self.decimate_factor(&contracts) else {
            return contracts;
        };

        contracts
            .into_iter()
            .filter(|c| is_multiple_of(c.strike, 5.0) || is_multiple_of(c.strike, factor))
            .collect()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Ordered list of filter stages; each stage sees the previous one's output.
pub struct FilterPipeline {
    stages: Vec<Box<dyn ChainFilter>>,
}

impl FilterPipeline {
    pub fn new(stages: Vec<Box<dyn ChainFilter>>) -> Self {
        Self { stages }
    }

    /// staleness -> moneyness window -> decimation
    pub fn collector_default(settings: &FilterSettings, now: DateTime<Utc>) -> Self {
        Self::new(vec![
            Box::new(StalenessFilter::new(settings.max_age_days, now)),
            Box::new(MoneynessWindowFilter::new(
                settings.atm_window_pct,
                settings.max_contracts,
            )),
            Box::new(DecimationFilter::new(settings.max_contracts)),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn apply(&self, chain: OptionsChain, current_price: f64) -> OptionsChain {
        self.stages
            .iter()
            .fold(chain, |chain, stage| stage.apply_chain(chain, current_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use optionwatch_market_data::OptionType;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 13, 17, 0, 0).unwrap()
    }

    fn call(strike: f64) -> Contract {
        Contract::new(OptionType::Call, strike, now(), 100.0)
    }

    fn ladder(from: f64, step: f64, count: usize) -> Vec<Contract> {
        (0..count).map(|i| call(from + step * i as f64)).collect()
    }

    fn strikes(contracts: &[Contract]) -> Vec<f64> {
        contracts.iter().map(|c| c.strike).collect()
    }

    #[test]
    fn test_staleness_boundary() {
        let filter = StalenessFilter::new(10, now());
        let mut fresh = call(100.0);
        fresh.last_trade_time = now() - Duration::days(9);
        let mut boundary = call(105.0);
        boundary.last_trade_time = now() - Duration::days(10);
        let mut old = call(110.0);
        old.last_trade_time = now() - Duration::days(400);

        let out = filter.apply(vec![fresh, boundary, old], 100.0);
        assert_eq!(strikes(&out), vec![100.0]);
    }

    #[test]
    fn test_moneyness_noop_when_small() {
        let filter = MoneynessWindowFilter::new(10.0, 5);
        let input = ladder(50.0, 25.0, 5);
        assert_eq!(filter.apply(input.clone(), 100.0), input);
    }

    #[test]
    fn test_moneyness_bounds_are_exclusive() {
        let filter = MoneynessWindowFilter::new(20.0, 2);
        let out = filter.apply(ladder(75.0, 5.0, 11), 100.0); // 75..125
        assert_eq!(strikes(&out), vec![85.0, 90.0, 95.0, 100.0, 105.0, 110.0, 115.0]);
    }

    #[test]
    fn test_moneyness_ignores_bad_price() {
        let filter = MoneynessWindowFilter::new(10.0, 2);
        let input = ladder(85.0, 5.0, 7);
        assert_eq!(filter.apply(input.clone(), 0.0).len(), 7);
        assert_eq!(filter.apply(input, f64::NAN).len(), 7);
    }

    #[test]
    fn test_decimation_noop_below_double() {
        // 15 contracts, max 10 -> floor(15/10) == 1 -> untouched
        let filter = DecimationFilter::new(10);
        let input = ladder(100.0, 1.0, 15);
        assert_eq!(filter.apply(input.clone(), 100.0), input);
    }

    #[test]
    fn test_decimation_keeps_round_and_factor_strikes() {
        // 100 strikes 1..=100, max 20 -> factor ceil(99/20) = 5
        let filter = DecimationFilter::new(20);
        let out = filter.apply(ladder(1.0, 1.0, 100), 100.0);
        assert_eq!(out.len(), 20);
        assert!(out.iter().all(|c| c.strike % 5.0 == 0.0));
    }

    #[test]
    fn test_decimation_uses_factor_for_odd_ladder() {
        // strikes 1..=61 step 1, max 20 -> factor ceil(60/20) = 3
        let filter = DecimationFilter::new(20);
        let out = filter.apply(ladder(1.0, 1.0, 61), 100.0);
        assert!(out.iter().any(|c| c.strike == 3.0));
        assert!(out.iter().any(|c| c.strike == 5.0));
        assert!(!out.iter().any(|c| c.strike == 7.0));
    }

    #[test]
    fn test_decimation_zero_factor_guard() {
        // all strikes equal -> factor 0 -> no-op
        let filter = DecimationFilter::new(2);
        let input: Vec<Contract> = (0..10).map(|_| call(101.0)).collect();
        assert_eq!(filter.apply(input, 100.0).len(), 10);

        let zero = DecimationFilter::new(0);
        assert_eq!(zero.apply(ladder(1.0, 1.0, 10), 100.0).len(), 10);
    }

    #[test]
    fn test_pipeline_order_and_sides() {
        let settings = FilterSettings {
            max_age_days: 10,
            atm_window_pct: 30.0,
            max_contracts: 10,
        };
        let pipeline = FilterPipeline::collector_default(&settings, now());
        assert_eq!(
            pipeline.stage_names(),
            vec!["staleness", "moneyness_window", "decimation"]
        );

        let mut calls = ladder(10.0, 1.0, 200); // 10..209
        calls[100].last_trade_time = now() - Duration::days(30);
        let puts = ladder(90.0, 5.0, 4);
        let out = pipeline.apply(OptionsChain::new(calls, puts.clone()), 100.0);

        assert!(out.calls.iter().all(|c| c.strike > 70.0 && c.strike < 130.0));
        assert!(out.calls.iter().all(|c| c.strike != 110.0));
        assert_eq!(out.puts, puts);
    }

    #[test]
    fn test_empty_chain_survives() {
        let pipeline = FilterPipeline::collector_default(&FilterSettings::default(), now());
        assert!(pipeline.apply(OptionsChain::default(), 100.0).is_empty());
    }

    fn arb_ladder() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(1u32..2000, 0..400).prop_map(|mut v| {
            v.sort_unstable();
            v.dedup();
            v.into_iter().map(|s| s as f64 / 2.0).collect()
        })
    }

    proptest! {
        #[test]
        fn prop_staleness_keeps_iff_younger(ages in prop::collection::vec(0i64..30, 0..50), max in 1u32..20) {
            let input: Vec<Contract> = ages
                .iter()
                .enumerate()
                .map(|(i, age)| {
                    let mut c = call(i as f64 + 1.0);
                    c.last_trade_time = now() - Duration::days(*age);
                    c
                })
                .collect();
            let out = StalenessFilter::new(max, now()).apply(input, 100.0);
            let expected = ages.iter().filter(|a| **a < i64::from(max)).count();
            prop_assert_eq!(out.len(), expected);
        }

        #[test]
        fn prop_decimation_keeps_round_strikes(raw in arb_ladder(), max in 1usize..60) {
            let input: Vec<Contract> = raw.iter().map(|s| call(*s)).collect();
            let round = raw.iter().filter(|s| *s % 5.0 == 0.0).count();
            let out = DecimationFilter::new(max).apply(input.clone(), 100.0);
            prop_assert!(out.len() >= round.min(input.len()));
            prop_assert!(out.len() <= input.len());
        }

        #[test]
        fn prop_decimation_noop_when_bounded(raw in arb_ladder(), max in 1usize..60) {
            let input: Vec<Contract> = raw.iter().take(max).map(|s| call(*s)).collect();
            let out = DecimationFilter::new(max).apply(input.clone(), 100.0);
            prop_assert_eq!(out, input);
        }

        #[test]
        fn prop_window_and_decimation_compose_in_either_order(
            raw in arb_ladder(),
            price in 10.0f64..900.0,
            max in 1usize..60,
        ) {
            let input: Vec<Contract> = raw.iter().map(|s| call(*s)).collect();
            let window = MoneynessWindowFilter::new(30.0, max);
            let decimate = DecimationFilter::new(max);

            let a = decimate.apply(window.apply(input.clone(), price), price);
            let b = window.apply(decimate.apply(input.clone(), price), price);
            prop_assert!(a.len() <= input.len());
            prop_assert!(b.len() <= input.len());
        }
    }
}
