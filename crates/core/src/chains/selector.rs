use optionwatch_market_data::Contract;

/// The contract picked by [`BestStrikeSelector::select`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrikeSelection {
    /// Index into the input list
    pub index: usize,
    /// Out-of-the-money percentage of the chosen strike
    pub otm_pct: f64,
}

/// Finds the strike closest to a target out-of-the-money percentage.
#[derive(Clone, Copy, Debug)]
pub struct BestStrikeSelector {
    target_otm_pct: f64,
}

impl BestStrikeSelector {
    pub fn new(target_otm_pct: f64) -> Self {
        Self { target_otm_pct }
    }

    pub fn target_otm_pct(&self) -> f64 {
        self.target_otm_pct
    }

    /// `(strike - price) / price * 100` for each contract; the one with the
    /// smallest distance to the target wins, first encountered on ties.
    ///
    /// Returns `None` for an empty list or a zero/non-finite price.
    pub fn select(&self, calls: &[Contract], current_price: f64) -> Option<StrikeSelection> {
        if !(current_price.is_finite() && current_price != 0.0) {
            return None;
        }

        let mut best: Option<(StrikeSelection, f64)> = None;
        for (index, contract) in calls.iter().enumerate() {
            let otm_pct = (contract.strike - current_price) / current_price * 100.0;
            let distance = (self.target_otm_pct - otm_pct).abs();
            if distance.is_nan() {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((StrikeSelection { index, otm_pct }, distance)),
            }
        }

        best.map(|(selection, _)| selection)
    }
}
