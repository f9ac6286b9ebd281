use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;

use optionwatch_market_data::OptionType;

use super::matrix::{Metric, SnapshotMatrix, SnapshotMatrixBuilder};
use crate::chains::{ChainStore, ExpirationId};
use crate::errors::{DatabaseError, Result};
use crate::forecast::{Forecast, ForecastPipeline, Sample, SequencePredictor};

/// Read-side views over stored expiration series.
pub struct SnapshotService {
    store: Arc<dyn ChainStore>,
    pipeline: ForecastPipeline,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self {
            store,
            pipeline: ForecastPipeline::default(),
        }
    }

    pub fn with_pipeline(mut self, pipeline: ForecastPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Matrix for one series, optionally restricted to `start..=end`.
    ///
    /// Fails with `NotFound` for an unknown series; a known series without
    /// data in range yields `Ok(None)`.
    pub fn matrix(
        &self,
        expiration_id: ExpirationId,
        option_type: OptionType,
        metric: Metric,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Option<SnapshotMatrix>> {
        if self.store.get_expiration(expiration_id)?.is_none() {
            return Err(DatabaseError::NotFound(format!("Expiration {}", expiration_id)).into());
        }

        let mut builder = SnapshotMatrixBuilder::new(option_type, metric);
        if let Some((start, end)) = range {
            builder = builder.with_range(start, end);
        }
        // Strike columns span the whole series, so load it unbounded.
        let series = self.store.query_range(expiration_id, None, None)?;
        debug!(
            "Building {:?} {} matrix for expiration {} from {} snapshots",
            metric,
            option_type,
            expiration_id,
            series.len()
        );
        builder.build(&series)
    }

    /// Forecast one strike's column of a matrix.
    pub fn forecast_strike(
        &self,
        predictor: &dyn SequencePredictor,
        expiration_id: ExpirationId,
        option_type: OptionType,
        metric: Metric,
        strike: f64,
    ) -> Result<Option<Forecast>> {
        let Some(matrix) = self.matrix(expiration_id, option_type, metric, None)? else {
            return Ok(None);
        };
        let Some(column) = matrix.strike_series(strike) else {
            debug!("Strike {} not present in expiration {}", strike, expiration_id);
            return Ok(None);
        };
        let samples: Vec<Sample> = column.into_iter().map(Sample::from).collect();
        self.pipeline.forecast(predictor, &samples)
    }
}
