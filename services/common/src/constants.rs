//! Shared constants
//!
//! Single source of truth for thresholds and window sizes used across the
//! analysis services.

/// Seconds a cached candle series stays fresh before a refetch
pub const CANDLE_CACHE_TTL_SECS: i64 = 3600;

/// Candles requested from the provider on a cache miss
pub const CANDLE_FETCH_LIMIT: usize = 500;

/// Minimum bars required before the backtester will run
pub const MIN_DATA_POINTS: usize = 50;

/// Forward bars used to validate a backtest prediction
pub const PREDICTION_HORIZON: usize = 24;

/// Default RSI period
pub const RSI_PERIOD: usize = 14;

/// Default RSI overbought threshold
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Default RSI oversold threshold
pub const RSI_OVERSOLD: f64 = 30.0;

/// EMA periods computed for every timeframe snapshot
pub const EMA_PERIODS: [usize; 4] = [9, 20, 50, 200];

/// Support/resistance pivot window (bars on each side)
pub const SR_WINDOW: usize = 20;

/// Other bars that must touch a pivot price to confirm a level
pub const SR_MIN_TOUCHES: usize = 2;

/// Price tolerance for counting a touch (0.2%)
pub const SR_TOUCH_TOLERANCE: f64 = 0.002;

/// Bins in a single-series volume profile
pub const VOLUME_PROFILE_BINS: usize = 100;

/// Bins in the per-timeframe order-book volume profiles
pub const DEPTH_PROFILE_BINS: usize = 50;

/// Fraction of total volume inside the value area
pub const VALUE_AREA_FRACTION: f64 = 0.7;

/// A level is a wall when its quantity exceeds this multiple of the side mean
pub const WALL_MEAN_MULTIPLE: f64 = 2.0;

/// A liquidity zone closes once it holds this fraction of side volume
pub const LIQUIDITY_ZONE_FRACTION: f64 = 0.1;

/// Depth levels requested from the provider
pub const DEFAULT_DEPTH_LEVELS: usize = 20;

/// Trading days per year, for annualizing return volatility
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Dollar depth at which the liquidity and depth scores are normalized
pub const DEPTH_NORMALIZATION: f64 = 1_000_000.0;

/// Confidence split between high- and low-confidence backtest buckets
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 75.0;
