//! Risk weighting configuration

use serde::{Deserialize, Serialize};

/// Component weights for the composite risk score.
///
/// `correlation` is declared for configuration parity but is not folded
/// into the composite; the four consumed weights sum to 0.90.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    /// Weight of the volatility risk term
    pub volatility: f64,
    /// Weight of the liquidity risk term
    pub liquidity: f64,
    /// Weight of the (1 - volume stability) term
    pub volume_stability: f64,
    /// Weight of the (1 - depth strength) term
    pub market_depth: f64,
    /// Declared but unconsumed
    pub correlation: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            volatility: 0.30,
            liquidity: 0.25,
            volume_stability: 0.15,
            market_depth: 0.20,
            correlation: 0.10,
        }
    }
}

impl RiskWeights {
    /// Composite score in [0, 100] from the four consumed sub-scores.
    pub fn composite(
        &self,
        volatility_risk: f64,
        liquidity_risk: f64,
        volume_stability: f64,
        depth_strength: f64,
    ) -> f64 {
        let score = (volatility_risk * self.volatility
            + liquidity_risk * self.liquidity
            + (1.0 - volume_stability) * self.volume_stability
            + (1.0 - depth_strength) * self.market_depth)
            * 100.0;
        score.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_case_composite_is_ninety() {
        // Consumed weights sum to 0.90, so the score tops out at 90.
        let weights = RiskWeights::default();
        assert!((weights.composite(1.0, 1.0, 0.0, 0.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn best_case_composite_is_zero() {
        let weights = RiskWeights::default();
        assert_eq!(weights.composite(0.0, 0.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn composite_matches_hand_computed_mix() {
        let weights = RiskWeights::default();
        // 0.30*0.5 + 0.25*0.2 + 0.15*(1-0.8) + 0.20*(1-0.6) = 0.31
        let score = weights.composite(0.5, 0.2, 0.8, 0.6);
        assert!((score - 31.0).abs() < 1e-9);
    }
}
