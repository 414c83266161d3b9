//! Candles, timeframes and order-book snapshots
//!
//! All prices and quantities are `f64`; validation rejects non-finite
//! values at construction so NaN/∞ never reach the scoring layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AnalysisError;

/// Candle aggregation timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1 minute bars
    M1,
    /// 5 minute bars
    M5,
    /// 15 minute bars
    M15,
    /// 1 hour bars
    H1,
    /// 4 hour bars
    H4,
    /// Daily bars
    D1,
}

impl Timeframe {
    /// All timeframes the analyzer understands.
    pub const ALL: [Self; 6] = [Self::M1, Self::M5, Self::M15, Self::H1, Self::H4, Self::D1];

    /// Timeframes analyzed by default in a complete analysis run.
    pub const DEFAULT_ANALYSIS: [Self; 4] = [Self::M15, Self::H1, Self::H4, Self::D1];

    /// Timeframes used for volume-profile and sentiment scans.
    pub const SENTIMENT: [Self; 3] = [Self::H1, Self::H4, Self::D1];

    /// Bar duration in seconds.
    pub const fn duration_seconds(&self) -> i64 {
        match self {
            Self::M1 => 60,
            Self::M5 => 300,
            Self::M15 => 900,
            Self::H1 => 3600,
            Self::H4 => 14400,
            Self::D1 => 86400,
        }
    }

    /// Exchange-style interval label ("15m", "4h", ...).
    pub const fn label(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }

    /// Weight of this timeframe in the directional vote.
    pub const fn signal_weight(&self) -> f64 {
        match self {
            Self::D1 => 1.0,
            Self::H4 => 0.5,
            _ => 0.25,
        }
    }

    /// Weight of this timeframe in the sentiment blend.
    pub const fn sentiment_weight(&self) -> f64 {
        match self {
            Self::D1 => 0.5,
            Self::H4 => 0.3,
            Self::H1 => 0.2,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Traded base-asset volume
    pub volume: f64,
}

impl Candle {
    /// True when every field is finite, prices are positive, volume is
    /// non-negative, and high/low bracket the body.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }

    /// Candle body length.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Shadow above the body.
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Shadow below the body.
    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Close above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Close below open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Time-ordered, duplicate-free candle sequence for one symbol+timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    /// Trading pair symbol, e.g. "BTCUSDT"
    pub symbol: String,
    /// Aggregation timeframe
    pub timeframe: Timeframe,
    /// Bars in ascending timestamp order
    pub candles: Vec<Candle>,
    /// Mark price attached by the provider at fetch time
    pub mark_price: Option<f64>,
    /// Funding rate attached by the provider at fetch time
    pub funding_rate: Option<f64>,
}

impl CandleSeries {
    /// Build a series, dropping invalid bars and enforcing ordering.
    ///
    /// Bars with non-finite fields are silently dropped rather than
    /// rejected wholesale; a bar timestamped at or before its predecessor
    /// is a duplicate and is dropped as well.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        let mut kept: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            if !candle.is_valid() {
                continue;
            }
            if let Some(last) = kept.last() {
                if candle.timestamp <= last.timestamp {
                    continue;
                }
            }
            kept.push(candle);
        }
        Self {
            symbol: symbol.into(),
            timeframe,
            candles: kept,
            mark_price: None,
            funding_rate: None,
        }
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// True when the series holds no bars.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Close prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Volumes in bar order.
    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    /// Last close price, if any bars exist.
    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    /// Sub-series over `range`, preserving symbol and timeframe.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Self {
        Self {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            candles: self.candles[range].to_vec(),
            mark_price: self.mark_price,
            funding_rate: self.funding_rate,
        }
    }
}

/// One resting order-book level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Level price
    pub price: f64,
    /// Resting quantity at the level
    pub quantity: f64,
}

/// Order-book depth snapshot for one symbol at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Trading pair symbol
    pub symbol: String,
    /// Bid levels, best (highest) first
    pub bids: Vec<BookLevel>,
    /// Ask levels, best (lowest) first
    pub asks: Vec<BookLevel>,
}

impl DepthSnapshot {
    /// Best bid price.
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    /// Best ask price.
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    /// Reject empty or crossed books and non-finite levels.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let all_levels = self.bids.iter().chain(self.asks.iter());
        for level in all_levels {
            if !level.price.is_finite() || !level.quantity.is_finite() || level.price <= 0.0 {
                return Err(AnalysisError::InvalidInput(format!(
                    "non-finite book level in {} snapshot",
                    self.symbol
                )));
            }
        }
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if bid < ask => Ok(()),
            (Some(_), Some(_)) => Err(AnalysisError::InvalidInput(format!(
                "crossed book in {} snapshot",
                self.symbol
            ))),
            _ => Err(AnalysisError::InvalidInput(format!(
                "empty book side in {} snapshot",
                self.symbol
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(ts: i64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn series_drops_invalid_and_duplicate_bars() {
        let mut bad = bar(60, 100.0);
        bad.high = f64::NAN;
        let series = CandleSeries::new(
            "BTCUSDT",
            Timeframe::H1,
            vec![bar(0, 100.0), bad, bar(60, 101.0), bar(60, 102.0)],
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_close(), Some(101.0));
    }

    #[test]
    fn crossed_book_is_rejected() {
        let snapshot = DepthSnapshot {
            symbol: "BTCUSDT".into(),
            bids: vec![BookLevel { price: 101.0, quantity: 1.0 }],
            asks: vec![BookLevel { price: 100.0, quantity: 1.0 }],
        };
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn candle_shadow_geometry() {
        let candle = Candle {
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 95.0,
            close: 104.0,
            volume: 1.0,
        };
        assert_eq!(candle.body(), 4.0);
        assert_eq!(candle.upper_shadow(), 6.0);
        assert_eq!(candle.lower_shadow(), 5.0);
        assert!(candle.is_bullish());
    }
}
