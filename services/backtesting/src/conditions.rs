//! Market regime classification for backtest slices

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use analyzer_common::constants::TRADING_DAYS_PER_YEAR;
use analyzer_common::Candle;

/// Bars needed for a reliable 20/50-SMA trend read
const TREND_MIN_BARS: usize = 50;
const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;

/// Directional regime from the 20/50 moving-average spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
    /// Too few bars to judge
    Unknown,
}

/// Last-bar volume relative to the slice mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeRegime {
    High,
    Low,
    /// Too few bars to judge
    Normal,
}

/// Conditions at the moment a prediction was made
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    /// Annualized stdev of close-to-close returns
    pub volatility: f64,
    pub trend: Trend,
    pub volume_regime: VolumeRegime,
}

impl MarketConditions {
    /// Classify one trailing slice of bars.
    pub fn from_bars(bars: &[Candle]) -> Self {
        if bars.len() < 2 {
            return Self { volatility: 0.0, trend: Trend::Unknown, volume_regime: VolumeRegime::Normal };
        }
        let returns: Vec<f64> = bars
            .windows(2)
            .filter(|pair| pair[0].close > 0.0)
            .map(|pair| (pair[1].close - pair[0].close) / pair[0].close)
            .collect();
        let volatility = if returns.len() < 2 {
            0.0
        } else {
            returns.std_dev() * TRADING_DAYS_PER_YEAR.sqrt()
        };

        let mean_volume = bars.iter().map(|c| c.volume).sum::<f64>() / bars.len() as f64;
        let last_volume = bars[bars.len() - 1].volume;
        let volume_regime = if last_volume > mean_volume { VolumeRegime::High } else { VolumeRegime::Low };

        Self { volatility, trend: classify_trend(bars), volume_regime }
    }
}

/// 20-SMA over 50-SMA trend read; `Unknown` under 50 bars.
pub fn classify_trend(bars: &[Candle]) -> Trend {
    if bars.len() < TREND_MIN_BARS {
        return Trend::Unknown;
    }
    let closes: Vec<f64> = bars.iter().map(|c| c.close).collect();
    let sma_short = closes[closes.len() - SMA_SHORT..].iter().mean();
    let sma_long = closes[closes.len() - SMA_LONG..].iter().mean();
    if sma_short > sma_long {
        Trend::Uptrend
    } else if sma_short < sma_long {
        Trend::Downtrend
    } else {
        Trend::Sideways
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bars(closes: impl Iterator<Item = f64>) -> Vec<Candle> {
        closes
            .enumerate()
            .map(|(i, close)| Candle {
                timestamp: Utc.timestamp_opt(i as i64 * 3600, 0).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn rising_slice_reads_as_uptrend() {
        let slice = bars((0..60).map(|i| 100.0 + i as f64));
        assert_eq!(classify_trend(&slice), Trend::Uptrend);
        let conditions = MarketConditions::from_bars(&slice);
        assert_eq!(conditions.trend, Trend::Uptrend);
        assert!(conditions.volatility > 0.0);
    }

    #[test]
    fn short_slice_is_unknown() {
        let slice = bars((0..24).map(|i| 100.0 + i as f64));
        assert_eq!(classify_trend(&slice), Trend::Unknown);
    }

    #[test]
    fn flat_slice_is_sideways_with_zero_volatility() {
        let slice = bars((0..60).map(|_| 100.0));
        assert_eq!(classify_trend(&slice), Trend::Sideways);
        assert_eq!(MarketConditions::from_bars(&slice).volatility, 0.0);
    }
}
