//! Collection loop.
//!
//! `once` runs a single pass immediately. `repeat` wakes every update period
//! and collects only inside the configured trading window.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::CollectMode;
use crate::main_lib::AppState;

async fn run_pass(state: &AppState) {
    let report = state.collector.collect_all(Utc::now()).await;
    if !report.is_clean() {
        for (symbol, error) in &report.failures {
            warn!("{} was not collected: {}", symbol, error);
        }
    }
}

pub async fn run(state: Arc<AppState>, mode: CollectMode) -> anyhow::Result<()> {
    match mode {
        CollectMode::Once => {
            run_pass(&state).await;
            Ok(())
        }
        CollectMode::Repeat => repeat(state).await,
    }
}

async fn repeat(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.collector.config();
    let period = Duration::from_secs(config.update_rate_secs);
    info!("Collector started, update every {} minutes", config.update_rate_secs / 60);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if config.is_collection_time(Utc::now())? {
                    run_pass(&state).await;
                } else {
                    debug!("Outside the collection window, skipping");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested, stopping collector");
                return Ok(());
            }
        }
    }
}
