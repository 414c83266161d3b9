//! Order-book depth analysis
//!
//! Pure function of a [`DepthSnapshot`]: spread, volume pressure, walls and
//! liquidity zones. An invalid snapshot (empty side, crossed book,
//! non-finite levels) produces the neutral result with a warning; depth
//! analysis never surfaces an error to the pipeline.

use serde::{Deserialize, Serialize};
use tracing::warn;

use analyzer_common::constants::{LIQUIDITY_ZONE_FRACTION, WALL_MEAN_MULTIPLE};
use analyzer_common::{BookLevel, Computed, DepthSnapshot};

/// Contiguous run of levels holding a meaningful share of side volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityZone {
    /// Lowest price in the zone
    pub price_low: f64,
    /// Highest price in the zone
    pub price_high: f64,
    /// Quantity accumulated across the zone
    pub total_quantity: f64,
    /// Number of book levels in the zone
    pub levels: usize,
}

/// Full depth analysis for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthAnalysis {
    /// Midpoint of best bid and best ask
    pub mid_price: f64,
    /// Absolute spread
    pub spread: f64,
    /// Spread relative to the best bid, in percent
    pub spread_pct: f64,
    /// Total bid quantity across levels
    pub bid_volume: f64,
    /// Total ask quantity across levels
    pub ask_volume: f64,
    /// bid/ask quantity ratio, infinite when the ask side holds nothing
    pub volume_ratio: f64,
    /// Bid share of total quantity, in percent
    pub buy_pressure: f64,
    /// Ask share of total quantity, in percent
    pub sell_pressure: f64,
    /// Bid levels larger than twice the side mean
    pub bid_walls: Vec<BookLevel>,
    /// Ask levels larger than twice the side mean
    pub ask_walls: Vec<BookLevel>,
    /// Greedy contiguous bid groups, best price first
    pub bid_zones: Vec<LiquidityZone>,
    /// Greedy contiguous ask groups, best price first
    pub ask_zones: Vec<LiquidityZone>,
}

impl DepthAnalysis {
    /// Neutral result for an unusable snapshot.
    pub fn neutral() -> Self {
        Self {
            mid_price: 0.0,
            spread: 0.0,
            spread_pct: 0.0,
            bid_volume: 0.0,
            ask_volume: 0.0,
            volume_ratio: 1.0,
            buy_pressure: 50.0,
            sell_pressure: 50.0,
            bid_walls: Vec::new(),
            ask_walls: Vec::new(),
            bid_zones: Vec::new(),
            ask_zones: Vec::new(),
        }
    }
}

/// Analyze one order-book snapshot.
pub fn analyze_depth(snapshot: &DepthSnapshot) -> Computed<DepthAnalysis> {
    if let Err(e) = snapshot.validate() {
        warn!(symbol = %snapshot.symbol, error = %e, "unusable depth snapshot");
        return Computed::Neutral(DepthAnalysis::neutral());
    }

    // validate() guarantees both sides are non-empty and uncrossed.
    let best_bid = snapshot.bids[0].price;
    let best_ask = snapshot.asks[0].price;
    let spread = best_ask - best_bid;

    let bid_volume: f64 = snapshot.bids.iter().map(|l| l.quantity).sum();
    let ask_volume: f64 = snapshot.asks.iter().map(|l| l.quantity).sum();
    let total = bid_volume + ask_volume;

    let volume_ratio = if ask_volume == 0.0 { f64::INFINITY } else { bid_volume / ask_volume };
    let (buy_pressure, sell_pressure) = if total == 0.0 {
        (50.0, 50.0)
    } else {
        (bid_volume / total * 100.0, ask_volume / total * 100.0)
    };

    Computed::Value(DepthAnalysis {
        mid_price: (best_bid + best_ask) / 2.0,
        spread,
        spread_pct: spread / best_bid * 100.0,
        bid_volume,
        ask_volume,
        volume_ratio,
        buy_pressure,
        sell_pressure,
        bid_walls: find_walls(&snapshot.bids),
        ask_walls: find_walls(&snapshot.asks),
        bid_zones: find_liquidity_zones(&snapshot.bids, bid_volume),
        ask_zones: find_liquidity_zones(&snapshot.asks, ask_volume),
    })
}

fn find_walls(levels: &[BookLevel]) -> Vec<BookLevel> {
    if levels.is_empty() {
        return Vec::new();
    }
    let mean = levels.iter().map(|l| l.quantity).sum::<f64>() / levels.len() as f64;
    let threshold = mean * WALL_MEAN_MULTIPLE;
    levels.iter().filter(|l| l.quantity > threshold).copied().collect()
}

/// Greedy left-to-right partition, closing a group once it holds 10% of the
/// side's total quantity. A trailing partial group is kept.
fn find_liquidity_zones(levels: &[BookLevel], side_volume: f64) -> Vec<LiquidityZone> {
    if levels.is_empty() || side_volume <= 0.0 {
        return Vec::new();
    }
    let target = side_volume * LIQUIDITY_ZONE_FRACTION;
    let mut zones = Vec::new();
    let mut start = 0;
    let mut accumulated = 0.0;
    for (i, level) in levels.iter().enumerate() {
        accumulated += level.quantity;
        if accumulated >= target || i == levels.len() - 1 {
            let group = &levels[start..=i];
            let (mut low, mut high) = (group[0].price, group[0].price);
            for l in group {
                low = low.min(l.price);
                high = high.max(l.price);
            }
            zones.push(LiquidityZone {
                price_low: low,
                price_high: high,
                total_quantity: accumulated,
                levels: group.len(),
            });
            start = i + 1;
            accumulated = 0.0;
        }
    }
    zones
}
