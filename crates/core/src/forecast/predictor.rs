//! Forecast pipeline around a black-box sequence model.

use log::debug;
use serde::{Deserialize, Serialize};

use super::scaler::MinMaxScaler;
use super::segmentation::{windowed_values, Sample};
use crate::constants::{FUTURE_COUNT, SAMPLES_PER_DAY, TEST_DATA_SIZE, TRAIN_WINDOW};
use crate::errors::{Error, Result};

/// A sequence-to-next-value model.
///
/// The window is already scaled into `[-1, 1]`; the prediction is expected
/// in the same units.
pub trait SequencePredictor: Send + Sync {
    fn predict_next(&self, window: &[f64]) -> Result<f64>;
}

/// `(window, next value)` pairs for collaborators that train a model.
pub fn training_pairs(series: &[f64], window: usize) -> Vec<(Vec<f64>, f64)> {
    if window == 0 || series.len() <= window {
        return Vec::new();
    }
    series
        .windows(window + 1)
        .map(|w| (w[..window].to_vec(), w[window]))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Model replay of the held-out last day
    pub last_day: Vec<f64>,
    /// Prediction for the following day
    pub next_day: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct ForecastPipeline {
    pub samples_per_day: usize,
    pub test_size: usize,
    pub train_window: usize,
    pub future_count: usize,
}

impl Default for ForecastPipeline {
    fn default() -> Self {
        Self {
            samples_per_day: SAMPLES_PER_DAY,
            test_size: TEST_DATA_SIZE,
            train_window: TRAIN_WINDOW,
            future_count: FUTURE_COUNT,
        }
    }
}

impl ForecastPipeline {
    /// The scaled series the model sees, plus the fitted scaler.
    ///
    /// `None` when fewer than `train_window` samples remain after windowing
    /// days and holding out the last `test_size` samples.
    pub fn prepare(&self, samples: &[Sample]) -> Option<(Vec<f64>, MinMaxScaler)> {
        let mut values = windowed_values(samples, self.samples_per_day);
        let keep = values.len().checked_sub(self.test_size)?;
        values.truncate(keep);
        if self.train_window == 0 || values.len() < self.train_window {
            return None;
        }
        let scaler = MinMaxScaler::fit(&values)?;
        Some((scaler.transform_all(&values), scaler))
    }

    /// Run the model autoregressively and unscale its output.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when there are too few complete days to seed the model.
    pub fn forecast(
        &self,
        predictor: &dyn SequencePredictor,
        samples: &[Sample],
    ) -> Result<Option<Forecast>> {
        let Some((scaled, scaler)) = self.prepare(samples) else {
            debug!("Not enough complete days to forecast ({} samples)", samples.len());
            return Ok(None);
        };

        let mut inputs: Vec<f64> = scaled[scaled.len() - self.train_window..].to_vec();
        for _ in 0..self.future_count {
            let window = &inputs[inputs.len() - self.train_window..];
            let next = predictor.predict_next(window)?;
            if !next.is_finite() {
                return Err(Error::Forecast(format!("predictor returned {}", next)));
            }
            inputs.push(next);
        }

        let predicted = scaler.inverse_all(&inputs[self.train_window..]);
        let split = self.test_size.min(predicted.len());
        Ok(Some(Forecast {
            last_day: predicted[..split].to_vec(),
            next_day: predicted[split..].to_vec(),
        }))
    }
}
