//! Walk-forward signal validation
//!
//! Replays the aggregator's current trade signal over a historical candle
//! window and reports how often its price targets would have been reached,
//! what the percent-move returns looked like, and how the failures break
//! down by market regime.

pub mod conditions;
pub mod engine;
pub mod metrics;

pub use conditions::{classify_trend, MarketConditions, Trend, VolumeRegime};
pub use engine::{
    analyze_historical_data, BacktestReport, BacktestStatus, Outcome, PredictedLevels, Prediction,
    PredictionRecord,
};
pub use metrics::{AccuracyMetrics, ErrorAnalysis, RoiMetrics};
