//! Forecast glue.
//!
//! The model itself is an external collaborator behind [`SequencePredictor`].
//! This module owns what happens around it: cutting the raw per-strike series
//! into uniform days, scaling into `[-1, 1]`, autoregressive rollout and
//! unscaling back to prices.

pub mod predictor;
pub mod scaler;
pub mod segmentation;

pub use predictor::{training_pairs, Forecast, ForecastPipeline, SequencePredictor};
pub use scaler::MinMaxScaler;
pub use segmentation::{segment_into_days, select_fixed_window, windowed_values, Sample};
