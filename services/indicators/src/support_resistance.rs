//! Support and resistance level detection

use analyzer_common::{CandleSeries, SR_MIN_TOUCHES, SR_TOUCH_TOLERANCE, SR_WINDOW};
use serde::{Deserialize, Serialize};

/// Confirmed horizontal levels, sorted ascending and deduplicated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    /// Confirmed support prices
    pub support: Vec<f64>,
    /// Confirmed resistance prices
    pub resistance: Vec<f64>,
}

impl SupportResistance {
    /// Supports strictly below `price`.
    pub fn supports_below(&self, price: f64) -> impl Iterator<Item = f64> + '_ {
        self.support.iter().copied().filter(move |s| *s < price)
    }

    /// Resistances strictly above `price`.
    pub fn resistances_above(&self, price: f64) -> impl Iterator<Item = f64> + '_ {
        self.resistance.iter().copied().filter(move |r| *r > price)
    }
}

/// Detect levels with the default 20-bar window and 2-touch confirmation.
pub fn compute_support_resistance(series: &CandleSeries) -> SupportResistance {
    compute_support_resistance_with(series, SR_WINDOW, SR_MIN_TOUCHES)
}

/// Detect levels with explicit parameters.
///
/// A bar is a support candidate when its low is the minimum low over
/// [i−window, i+window); resistance is symmetric on highs, and a bar that
/// qualifies as support is not also tested as resistance. A candidate is
/// confirmed when at least `min_touches` other bars trade within 0.2% of
/// its price. Empty input returns empty level lists.
pub fn compute_support_resistance_with(
    series: &CandleSeries,
    window: usize,
    min_touches: usize,
) -> SupportResistance {
    let candles = &series.candles;
    if candles.len() <= window * 2 || window == 0 {
        return SupportResistance::default();
    }

    let mut support = Vec::new();
    let mut resistance = Vec::new();

    for i in window..(candles.len() - window) {
        let neighborhood = &candles[i - window..i + window];
        let low = candles[i].low;
        let high = candles[i].high;

        if neighborhood.iter().all(|c| c.low >= low) {
            let touches = candles
                .iter()
                .enumerate()
                .filter(|(j, c)| *j != i && (c.low - low).abs() <= low * SR_TOUCH_TOLERANCE)
                .count();
            if touches >= min_touches {
                support.push(low);
            }
        } else if neighborhood.iter().all(|c| c.high <= high) {
            let touches = candles
                .iter()
                .enumerate()
                .filter(|(j, c)| *j != i && (c.high - high).abs() <= high * SR_TOUCH_TOLERANCE)
                .count();
            if touches >= min_touches {
                resistance.push(high);
            }
        }
    }

    SupportResistance {
        support: sort_dedup(support),
        resistance: sort_dedup(resistance),
    }
}

fn sort_dedup(mut levels: Vec<f64>) -> Vec<f64> {
    levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    levels.dedup();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer_common::{Candle, Timeframe};
    use chrono::{TimeZone, Utc};

    fn series(lows_highs: &[(f64, f64)]) -> CandleSeries {
        let candles = lows_highs
            .iter()
            .enumerate()
            .map(|(i, &(low, high))| Candle {
                timestamp: Utc.timestamp_opt(i as i64 * 3600, 0).unwrap(),
                open: (low + high) / 2.0,
                high,
                low,
                close: (low + high) / 2.0,
                volume: 1.0,
            })
            .collect();
        CandleSeries::new("BTCUSDT", Timeframe::H1, candles)
    }

    #[test]
    fn empty_series_yields_empty_levels() {
        let empty = series(&[]);
        let levels = compute_support_resistance(&empty);
        assert!(levels.support.is_empty());
        assert!(levels.resistance.is_empty());
    }

    #[test]
    fn pivot_low_with_retests_becomes_support() {
        // Flat band at 100/101 with a pivot low at bar 5 retested twice.
        let mut bars: Vec<(f64, f64)> = vec![(100.0, 101.0); 13];
        bars[5] = (98.0, 101.0);
        bars[2] = (98.1, 101.0);
        bars[11] = (98.05, 101.0);
        let levels = compute_support_resistance_with(&series(&bars), 3, 2);
        assert_eq!(levels.support, vec![98.0]);
    }

    #[test]
    fn lone_pivot_without_touches_is_unconfirmed() {
        let mut bars: Vec<(f64, f64)> = vec![(100.0, 101.0); 13];
        bars[6] = (90.0, 101.0);
        let levels = compute_support_resistance_with(&series(&bars), 3, 2);
        assert!(levels.support.is_empty());
    }

    #[test]
    fn pivot_high_with_retests_becomes_resistance() {
        // Descending lows keep every bar from qualifying as support, so the
        // pivot high at bar 6 is evaluated as resistance.
        let mut bars: Vec<(f64, f64)> = (0..13)
            .map(|i| (100.0 - i as f64 * 0.5, 101.0))
            .collect::<Vec<_>>();
        bars[6].1 = 105.0;
        bars[3].1 = 104.9;
        bars[10].1 = 104.95;
        let levels = compute_support_resistance_with(&series(&bars), 3, 2);
        assert_eq!(levels.resistance, vec![105.0]);
    }
}
