use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use optionwatch_core::chains::ChainStore;
use optionwatch_core::config::ProviderKind;
use optionwatch_core::CollectorService;
use optionwatch_market_data::{OptionsDataSource, TradierProvider, YahooProvider};
use optionwatch_storage_sqlite::{create_pool, init, run_migrations, spawn_writer, ChainRepository};

use crate::config::Config;

pub struct AppState {
    pub collector: Arc<CollectorService>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("OW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

fn build_source(kind: ProviderKind, config: &Config) -> anyhow::Result<Arc<dyn OptionsDataSource>> {
    let source: Arc<dyn OptionsDataSource> = match kind {
        ProviderKind::Tradier => {
            let token = config
                .tradier_token
                .clone()
                .ok_or_else(|| anyhow::anyhow!("OW_TRADIER_TOKEN is not set"))?;
            Arc::new(TradierProvider::with_base_url(token, config.tradier_base_url.clone()))
        }
        ProviderKind::Yahoo => Arc::new(YahooProvider::new()),
    };
    Ok(source)
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let collector_config = config.collector_config()?;

    let db_path = init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);
    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let store: Arc<dyn ChainStore> = Arc::new(ChainRepository::new(pool.clone(), writer));
    let source = build_source(collector_config.provider, config)?;
    tracing::info!(
        "Collecting {} symbols from {}",
        collector_config.watchlist.len(),
        source.id()
    );

    Ok(Arc::new(AppState {
        collector: Arc::new(CollectorService::new(source, store, collector_config)),
        db_path,
    }))
}
