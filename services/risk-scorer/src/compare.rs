//! Cross-pair risk ranking

use serde::{Deserialize, Serialize};

use crate::metrics::{RiskLevel, RiskMetrics};

/// One ranked entry in a cross-pair comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRisk {
    pub symbol: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub volatility_risk: f64,
    pub liquidity_risk: f64,
    pub volume_stability: f64,
    pub depth_strength: f64,
}

/// Rank pairs ascending by composite risk, safest first.
pub fn compare_trading_pairs<'a, I>(pairs: I) -> Vec<PairRisk>
where
    I: IntoIterator<Item = (&'a str, &'a RiskMetrics)>,
{
    let mut ranked: Vec<PairRisk> = pairs
        .into_iter()
        .map(|(symbol, metrics)| PairRisk {
            symbol: symbol.to_string(),
            risk_score: metrics.overall_risk_score,
            risk_level: metrics.risk_level,
            volatility_risk: metrics.volatility_risk,
            liquidity_risk: metrics.liquidity_risk,
            volume_stability: metrics.volume_stability,
            depth_strength: metrics.market_depth.strength,
        })
        .collect();
    ranked.sort_by(|a, b| a.risk_score.total_cmp(&b.risk_score));
    ranked
}
