//! Day segmentation of irregular sample series.
//!
//! Collection cadence is approximate, so a day may carry any number of
//! samples. Forecasting needs the same number per day: days are windowed to
//! their last `n` samples and short days are dropped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }

    fn day(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

impl From<(DateTime<Utc>, f64)> for Sample {
    fn from((time, value): (DateTime<Utc>, f64)) -> Self {
        Self { time, value }
    }
}

/// Groups consecutive samples sharing a UTC calendar day.
///
/// Only adjacency matters: a day that reappears later in the input starts a
/// new bucket.
pub fn segment_into_days(samples: &[Sample]) -> Vec<Vec<Sample>> {
    let mut days: Vec<Vec<Sample>> = Vec::new();
    for sample in samples {
        match days.last_mut() {
            Some(bucket) if bucket[0].day() == sample.day() => bucket.push(*sample),
            _ => days.push(vec![*sample]),
        }
    }
    days
}

/// Last `n` samples of a day, or `None` if the day is shorter than `n`.
pub fn select_fixed_window(day: &[Sample], n: usize) -> Option<&[Sample]> {
    (day.len() >= n).then(|| &day[day.len() - n..])
}

/// Segments, windows and flattens to plain values, skipping NaN samples.
pub fn windowed_values(samples: &[Sample], per_day: usize) -> Vec<f64> {
    let clean: Vec<Sample> = samples.iter().filter(|s| !s.value.is_nan()).copied().collect();
    segment_into_days(&clean)
        .iter()
        .filter_map(|day| select_fixed_window(day, per_day))
        .flat_map(|window| window.iter().map(|s| s.value))
        .collect()
}
