//! Risk sub-scores and the composite metric set
//!
//! Every sub-score is clamped to [0, 1] and fails conservatively: a
//! computation that cannot run (too few bars, missing order book) yields
//! the highest-risk value for risk terms and the lowest for stability and
//! strength terms.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use analyzer_common::constants::{DEPTH_NORMALIZATION, TRADING_DAYS_PER_YEAR};
use analyzer_common::{CandleSeries, Computed};
use indicators::VolumeProfile;
use market_analyzer::DepthAnalysis;

use crate::config::RiskWeights;

const ATR_PERIOD: usize = 14;
const VOLUME_WINDOW: usize = 20;
const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;

/// Price stability against short and long moving averages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceStability {
    /// Stability against the 20-period average
    pub short_term: f64,
    /// Stability against the 50-period average
    pub long_term: f64,
    /// Mean of the two
    pub overall: f64,
}

impl PriceStability {
    fn unstable() -> Self {
        Self { short_term: 0.0, long_term: 0.0, overall: 0.0 }
    }
}

/// Depth strength and distribution scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketDepthScore {
    /// Sigmoid-normalized total depth
    pub strength: f64,
    /// min(bid, ask) relative to half the total depth
    pub balance: f64,
    /// Wall quantity share of total depth
    pub wall_strength: f64,
}

impl MarketDepthScore {
    fn absent() -> Self {
        Self { strength: 0.0, balance: 0.0, wall_strength: 0.0 }
    }
}

/// Five-level classification of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Bucket a composite score into five equal 20-point bands.
    pub fn from_score(score: f64) -> Self {
        if score < 20.0 {
            Self::VeryLow
        } else if score < 40.0 {
            Self::Low
        } else if score < 60.0 {
            Self::Moderate
        } else if score < 80.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full risk metric set for one trading pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// ATR and annualized-stdev volatility, in [0, 1]
    pub volatility_risk: f64,
    /// Spread, depth and imbalance blend, in [0, 1]
    pub liquidity_risk: f64,
    /// Inverse rolling volume volatility, in [0, 1]
    pub volume_stability: f64,
    /// Deviation-from-average stability breakdown
    pub price_stability: PriceStability,
    /// Depth strength and distribution
    pub market_depth: MarketDepthScore,
    /// Volume share inside the value area, in [0, 1]
    pub sr_strength: f64,
    /// Weighted composite, 0 (safest) to 100
    pub overall_risk_score: f64,
    /// Banded classification of the composite
    pub risk_level: RiskLevel,
}

/// Compute the full risk metric set for one pair.
pub fn calculate_risk_metrics(
    series: &CandleSeries,
    depth: &Computed<DepthAnalysis>,
    profile: &Computed<VolumeProfile>,
    weights: &RiskWeights,
) -> RiskMetrics {
    let volatility_risk = volatility_risk(series);
    let liquidity_risk = liquidity_risk(depth);
    let volume_stability = volume_stability(series);
    let price_stability = price_stability(series);
    let market_depth = market_depth_score(depth);
    let sr_strength = sr_strength(profile);

    let overall_risk_score = weights.composite(
        volatility_risk,
        liquidity_risk,
        volume_stability,
        market_depth.strength,
    );
    debug!(
        symbol = %series.symbol,
        score = overall_risk_score,
        volatility_risk,
        liquidity_risk,
        "risk metrics computed"
    );

    RiskMetrics {
        volatility_risk,
        liquidity_risk,
        volume_stability,
        price_stability,
        market_depth,
        sr_strength,
        overall_risk_score,
        risk_level: RiskLevel::from_score(overall_risk_score),
    }
}

/// Average of the normalized 14-period ATR and annualized return stdev.
pub fn volatility_risk(series: &CandleSeries) -> f64 {
    let candles = &series.candles;
    if candles.len() < ATR_PERIOD + 1 {
        return 1.0;
    }
    let Some(last_close) = series.last_close() else { return 1.0 };
    if last_close <= 0.0 {
        return 1.0;
    }

    let true_ranges: Vec<f64> = candles
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close;
            let bar = &pair[1];
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        })
        .collect();
    let atr = true_ranges[true_ranges.len() - ATR_PERIOD..].iter().mean();

    let returns: Vec<f64> = candles
        .windows(2)
        .filter(|pair| pair[0].close > 0.0)
        .map(|pair| (pair[1].close - pair[0].close) / pair[0].close)
        .collect();
    if returns.len() < 2 {
        return 1.0;
    }
    let annualized = returns.std_dev() * TRADING_DAYS_PER_YEAR.sqrt();

    let normalized_atr = (atr / last_close).min(1.0);
    let normalized_vol = annualized.min(1.0);
    (normalized_atr + normalized_vol) / 2.0
}

/// Spread, depth and imbalance blend. A neutral (missing) book is maximal
/// risk.
pub fn liquidity_risk(depth: &Computed<DepthAnalysis>) -> f64 {
    if depth.is_neutral() {
        return 1.0;
    }
    let depth = depth.value();
    let spread_risk = (depth.spread_pct / 100.0).min(1.0);
    let total = depth.bid_volume + depth.ask_volume;
    let depth_risk = 1.0 / (1.0 + total / DEPTH_NORMALIZATION);
    let bid_share = if total > 0.0 { depth.bid_volume / total } else { 0.5 };
    let imbalance = (0.5 - bid_share).abs();

    (spread_risk * 0.4 + depth_risk * 0.4 + imbalance * 0.2).clamp(0.0, 1.0)
}

/// Inverse of the mean 20-period rolling volume volatility.
pub fn volume_stability(series: &CandleSeries) -> f64 {
    let volumes = series.volumes();
    if volumes.len() < VOLUME_WINDOW {
        return 0.0;
    }
    let ratios: Vec<f64> = volumes
        .windows(VOLUME_WINDOW)
        .filter_map(|window| {
            let mean = window.iter().mean();
            if mean > 0.0 { Some(window.iter().std_dev() / mean) } else { None }
        })
        .collect();
    if ratios.is_empty() {
        return 0.0;
    }
    (1.0 / (1.0 + ratios.iter().mean())).clamp(0.0, 1.0)
}

/// Mean absolute deviation of the close from its 20- and 50-period
/// averages, inverted into stability scores.
pub fn price_stability(series: &CandleSeries) -> PriceStability {
    let closes = series.closes();
    let Some(short) = mean_deviation(&closes, SMA_SHORT) else {
        return PriceStability::unstable();
    };
    let Some(long) = mean_deviation(&closes, SMA_LONG) else {
        return PriceStability::unstable();
    };
    let short_term = 1.0 / (1.0 + short);
    let long_term = 1.0 / (1.0 + long);
    PriceStability { short_term, long_term, overall: (short_term + long_term) / 2.0 }
}

fn mean_deviation(closes: &[f64], window: usize) -> Option<f64> {
    if closes.len() < window {
        return None;
    }
    let deviations: Vec<f64> = closes
        .windows(window)
        .filter_map(|w| {
            let sma = w.iter().mean();
            if sma > 0.0 { Some((w[window - 1] - sma).abs() / sma) } else { None }
        })
        .collect();
    if deviations.is_empty() { None } else { Some(deviations.iter().mean()) }
}

/// Sigmoid depth strength plus balance and wall share.
pub fn market_depth_score(depth: &Computed<DepthAnalysis>) -> MarketDepthScore {
    if depth.is_neutral() {
        return MarketDepthScore::absent();
    }
    let depth = depth.value();
    let total = depth.bid_volume + depth.ask_volume;
    let balance = if total > 0.0 {
        depth.bid_volume.min(depth.ask_volume) / (total / 2.0)
    } else {
        0.0
    };
    let walls: f64 = depth
        .bid_walls
        .iter()
        .chain(depth.ask_walls.iter())
        .map(|l| l.quantity)
        .sum();
    let wall_strength = if total > 0.0 { walls / total } else { 0.0 };
    let strength = 1.0 / (1.0 + (-total / DEPTH_NORMALIZATION).exp());

    MarketDepthScore { strength, balance, wall_strength }
}

/// Share of profile volume inside the value area.
pub fn sr_strength(profile: &Computed<VolumeProfile>) -> f64 {
    if profile.is_neutral() {
        return 0.0;
    }
    let profile = profile.value();
    if profile.total_volume <= 0.0 {
        return 0.0;
    }
    let value_area_volume: f64 = profile
        .price_levels
        .iter()
        .zip(profile.volumes.iter())
        .filter(|(price, _)| {
            **price >= profile.value_area_low && **price <= profile.value_area_high
        })
        .map(|(_, volume)| volume)
        .sum();
    value_area_volume / profile.total_volume
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer_common::{BookLevel, Candle, Timeframe};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn series(bars: &[(f64, f64, f64, f64, f64)]) -> CandleSeries {
        let candles = bars
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close, volume))| Candle {
                timestamp: Utc.timestamp_opt(i as i64 * 3600, 0).unwrap(),
                open,
                high,
                low,
                close,
                volume,
            })
            .collect();
        CandleSeries::new("BTCUSDT", Timeframe::H1, candles)
    }

    fn quiet_series(len: usize) -> CandleSeries {
        let bars: Vec<_> = (0..len)
            .map(|_| (100.0, 100.05, 99.95, 100.0, 10.0))
            .collect();
        series(&bars)
    }

    fn deep_book() -> Computed<DepthAnalysis> {
        let mut depth = DepthAnalysis::neutral();
        depth.spread_pct = 0.01;
        depth.bid_volume = 2_000_000.0;
        depth.ask_volume = 2_000_000.0;
        Computed::Value(depth)
    }

    #[rstest]
    #[case(0.0, RiskLevel::VeryLow)]
    #[case(19.9, RiskLevel::VeryLow)]
    #[case(20.0, RiskLevel::Low)]
    #[case(40.0, RiskLevel::Moderate)]
    #[case(60.0, RiskLevel::High)]
    #[case(80.0, RiskLevel::VeryHigh)]
    #[case(100.0, RiskLevel::VeryHigh)]
    fn risk_bands_are_twenty_points_wide(#[case] score: f64, #[case] expected: RiskLevel) {
        assert_eq!(RiskLevel::from_score(score), expected);
    }

    #[test]
    fn quiet_market_has_low_volatility_risk() {
        let risk = volatility_risk(&quiet_series(60));
        assert!(risk < 0.05, "got {risk}");
    }

    #[test]
    fn short_series_is_maximally_volatile() {
        assert_eq!(volatility_risk(&quiet_series(10)), 1.0);
    }

    #[test]
    fn missing_book_is_maximal_liquidity_risk() {
        assert_eq!(liquidity_risk(&Computed::Neutral(DepthAnalysis::neutral())), 1.0);
    }

    #[test]
    fn deep_balanced_book_has_low_liquidity_risk() {
        // spread_risk 0.0001, depth_risk 0.2, imbalance 0.
        let risk = liquidity_risk(&deep_book());
        assert!((risk - (0.0001 * 0.4 + 0.2 * 0.4)).abs() < 1e-6);
    }

    #[test]
    fn liquidity_risk_never_falls_as_spread_widens() {
        let mut previous = 0.0;
        for step in 0..200 {
            let mut depth = DepthAnalysis::neutral();
            depth.spread_pct = step as f64 * 0.75;
            depth.bid_volume = 500_000.0;
            depth.ask_volume = 500_000.0;
            let risk = liquidity_risk(&Computed::Value(depth));
            assert!(risk >= previous, "risk fell from {previous} to {risk} at step {step}");
            previous = risk;
        }
    }

    #[test]
    fn constant_volume_is_perfectly_stable() {
        assert_eq!(volume_stability(&quiet_series(40)), 1.0);
    }

    #[test]
    fn too_few_bars_reads_as_unstable() {
        assert_eq!(volume_stability(&quiet_series(10)), 0.0);
        assert_eq!(price_stability(&quiet_series(30)), PriceStability::unstable());
    }

    #[test]
    fn flat_price_is_perfectly_stable() {
        let stability = price_stability(&quiet_series(80));
        assert!((stability.overall - 1.0).abs() < 1e-9);
    }

    #[test]
    fn depth_strength_is_sigmoid_of_total() {
        let score = market_depth_score(&deep_book());
        let expected = 1.0 / (1.0 + (-4.0f64).exp());
        assert!((score.strength - expected).abs() < 1e-9);
        assert_eq!(score.balance, 1.0);
        assert_eq!(score.wall_strength, 0.0);
    }

    #[test]
    fn wall_share_counts_both_sides() {
        let mut depth = DepthAnalysis::neutral();
        depth.bid_volume = 600.0;
        depth.ask_volume = 400.0;
        depth.bid_walls = vec![BookLevel { price: 100.0, quantity: 200.0 }];
        depth.ask_walls = vec![BookLevel { price: 101.0, quantity: 100.0 }];
        let score = market_depth_score(&Computed::Value(depth));
        assert!((score.wall_strength - 0.3).abs() < 1e-9);
        assert!((score.balance - 0.8).abs() < 1e-9);
    }

    #[test]
    fn value_area_share_drives_sr_strength() {
        let profile = VolumeProfile {
            price_levels: vec![100.0, 101.0, 102.0, 103.0],
            volumes: vec![10.0, 40.0, 30.0, 20.0],
            poc: 101.0,
            value_area_low: 101.0,
            value_area_high: 102.0,
            total_volume: 100.0,
        };
        assert!((sr_strength(&Computed::Value(profile)) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn composite_prefers_the_quiet_deep_market() {
        let weights = RiskWeights::default();
        let profile = Computed::Neutral(VolumeProfile::default());
        let calm = calculate_risk_metrics(&quiet_series(80), &deep_book(), &profile, &weights);
        let blind = calculate_risk_metrics(
            &quiet_series(10),
            &Computed::Neutral(DepthAnalysis::neutral()),
            &profile,
            &weights,
        );
        assert!(calm.overall_risk_score < blind.overall_risk_score);
        assert_eq!(blind.risk_level, RiskLevel::VeryHigh);
    }
}
