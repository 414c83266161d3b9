//! Per-timeframe technical snapshot
//!
//! One snapshot folds every indicator the voting logic reads into plain
//! last-bar values: EMA levels, RSI state, support/resistance, the latest
//! pattern signals and the volume-profile aggregates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use analyzer_common::constants::EMA_PERIODS;
use analyzer_common::{CandleSeries, Timeframe};
use indicators::{
    compute_ema, compute_rsi, compute_support_resistance, compute_volume_profile, scan_all,
    SupportResistance,
};

/// Last-bar RSI state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiSummary {
    /// RSI value, 50 when neutral
    pub value: f64,
    /// +1 oversold, -1 overbought, 0 otherwise
    pub signal: i8,
    pub bullish_divergence: bool,
    pub bearish_divergence: bool,
}

/// Volume-profile aggregates the voting and display layers read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub poc: f64,
    pub value_area_high: f64,
    pub value_area_low: f64,
}

/// All last-bar technical state for one (symbol, timeframe)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub timeframe: Timeframe,
    /// Last EMA value per period
    pub emas: FxHashMap<usize, f64>,
    pub rsi: RsiSummary,
    pub support_resistance: SupportResistance,
    /// Latest signal per pattern name
    pub patterns: Vec<(String, i8)>,
    pub volume: VolumeSummary,
}

impl TechnicalSnapshot {
    /// Build a snapshot from one candle series. Empty series yield `None`;
    /// the caller drops that timeframe and continues.
    pub fn from_series(series: &CandleSeries) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        let closes = series.closes();

        let ema_series = compute_ema(&closes, &EMA_PERIODS);
        let mut emas = FxHashMap::default();
        for (&period, values) in &ema_series {
            if let Some(&last) = values.last() {
                emas.insert(period, last);
            }
        }

        let rsi_analysis = compute_rsi(&closes);
        let rsi = RsiSummary {
            value: rsi_analysis.value().last_value(),
            signal: rsi_analysis.value().last_signal(),
            bullish_divergence: rsi_analysis.value().last_bullish_divergence(),
            bearish_divergence: rsi_analysis.value().last_bearish_divergence(),
        };

        let profile = compute_volume_profile(series);
        let volume = VolumeSummary {
            poc: profile.value().poc,
            value_area_high: profile.value().value_area_high,
            value_area_low: profile.value().value_area_low,
        };

        Some(Self {
            timeframe: series.timeframe,
            emas,
            rsi,
            support_resistance: compute_support_resistance(series),
            patterns: scan_all(series)
                .latest()
                .iter()
                .map(|&(name, signal)| (name.to_string(), signal))
                .collect(),
            volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer_common::Candle;
    use chrono::{TimeZone, Utc};

    fn rising_series(len: usize) -> CandleSeries {
        let candles = (0..len)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.5;
                Candle {
                    timestamp: Utc.timestamp_opt(i as i64 * 3600, 0).unwrap(),
                    open: close - 0.5,
                    high: close + 0.5,
                    low: close - 1.0,
                    close,
                    volume: 10.0,
                }
            })
            .collect();
        CandleSeries::new("BTCUSDT", Timeframe::H1, candles)
    }

    #[test]
    fn rising_series_aligns_emas_bullishly() {
        let snapshot = TechnicalSnapshot::from_series(&rising_series(300)).unwrap();
        let e9 = snapshot.emas[&9];
        let e20 = snapshot.emas[&20];
        let e50 = snapshot.emas[&50];
        assert!(e9 > e20 && e20 > e50, "expected 9 > 20 > 50, got {e9} {e20} {e50}");
        assert!(snapshot.rsi.value > 70.0);
    }

    #[test]
    fn empty_series_yields_no_snapshot() {
        let empty = CandleSeries::new("BTCUSDT", Timeframe::H1, Vec::new());
        assert!(TechnicalSnapshot::from_series(&empty).is_none());
    }
}
