/// Seconds between collection cycles
pub const DEFAULT_UPDATE_RATE_SECS: u64 = 900;

/// Monthly expirations collected per symbol
pub const DEFAULT_COLLECTOR_LOOK_AHEAD: usize = 3;

/// Monthly expirations screened per symbol
pub const DEFAULT_SCREENER_LOOK_AHEAD: usize = 5;

/// Contracts whose last trade is this many days old (or older) are dropped
pub const DEFAULT_MAX_AGE_DAYS: u32 = 10;

/// Half-width of the at-the-money window, percent of the underlying price
pub const DEFAULT_ATM_WINDOW_PCT: f64 = 30.0;

/// Upper bound on contracts kept per side before windowing/decimation kick in
pub const DEFAULT_MAX_CONTRACTS: usize = 50;

/// Shares per equity option contract
pub const CONTRACT_MULTIPLIER: i64 = 100;

/// Days per year used to annualize screener yields
pub const DAYS_PER_YEAR: f64 = 365.0;

// Forecasting

/// Samples kept per trading day
pub const SAMPLES_PER_DAY: usize = 24;

/// Samples held out at the end of the series
pub const TEST_DATA_SIZE: usize = 24;

/// Input window length handed to the predictor
pub const TRAIN_WINDOW: usize = 24;

/// Autoregressive steps produced per forecast
pub const FUTURE_COUNT: usize = 48;
