//! Composite risk scoring
//!
//! Folds volatility, liquidity, volume stability and market depth into a
//! single 0-100 score (lower is safer), classifies it into five bands and
//! ranks trading pairs against each other. Sub-scores that cannot be
//! computed fail conservatively instead of erroring.

pub mod compare;
pub mod config;
pub mod metrics;

pub use compare::{compare_trading_pairs, PairRisk};
pub use config::RiskWeights;
pub use metrics::{
    calculate_risk_metrics, MarketDepthScore, PriceStability, RiskLevel, RiskMetrics,
};
