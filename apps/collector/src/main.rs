mod config;
mod main_lib;
mod scheduler;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::from_env()?;
    let state = build_state(&config).await?;
    tracing::info!("Collector using {} ({:?} mode)", state.db_path, config.mode);
    scheduler::run(state, config.mode).await
}
