//! Candlestick pattern scanner
//!
//! Five detectors over a sliding window of up to four consecutive candles.
//! Signals are per-bar: +1 bullish, −1 bearish, 0 undefined. Doji and
//! hammer are single-candle shapes and only ever emit +1/0. The detection
//! thresholds intentionally match the production signal weighting and
//! diverge from textbook definitions in two places: engulfing requires a
//! strictly larger body than the prior candle, and three-line strike
//! requires monotonically extending closes before the reversal bar.

use analyzer_common::{Candle, CandleSeries};
use serde::{Deserialize, Serialize};

/// Body-to-shadow tolerance for doji and star middles
const DOJI_TOLERANCE: f64 = 0.1;
/// Maximum body share of the total range for a hammer
const HAMMER_BODY_RATIO: f64 = 0.3;
/// Minimum lower-shadow multiple of the body for a hammer
const HAMMER_SHADOW_RATIO: f64 = 2.0;
/// Maximum upper-shadow multiple of the body for a hammer
const HAMMER_UPPER_RATIO: f64 = 0.1;

/// Per-bar signals for every scanned pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSignals {
    /// Doji per bar (+1/0)
    pub doji: Vec<i8>,
    /// Hammer per bar (+1/0)
    pub hammer: Vec<i8>,
    /// Engulfing per bar (+1/−1/0)
    pub engulfing: Vec<i8>,
    /// Morning/evening star per bar (+1/−1/0)
    pub star: Vec<i8>,
    /// Three-line strike per bar (+1/−1/0)
    pub three_line_strike: Vec<i8>,
}

impl PatternSignals {
    /// Latest signal per pattern, in a stable (name, signal) order.
    pub fn latest(&self) -> [(&'static str, i8); 5] {
        [
            ("doji", last(&self.doji)),
            ("hammer", last(&self.hammer)),
            ("engulfing", last(&self.engulfing)),
            ("star", last(&self.star)),
            ("three_line_strike", last(&self.three_line_strike)),
        ]
    }
}

fn last(signals: &[i8]) -> i8 {
    signals.last().copied().unwrap_or(0)
}

/// Scan the full series for every supported pattern.
///
/// A malformed bar defaults to 0 for that bar only; the scan never aborts.
pub fn scan_all(series: &CandleSeries) -> PatternSignals {
    let candles = &series.candles;
    let n = candles.len();
    let mut signals = PatternSignals {
        doji: vec![0; n],
        hammer: vec![0; n],
        engulfing: vec![0; n],
        star: vec![0; n],
        three_line_strike: vec![0; n],
    };

    for i in 0..n {
        if !candles[i].is_valid() {
            continue;
        }
        signals.doji[i] = detect_doji(&candles[i]);
        signals.hammer[i] = detect_hammer(&candles[i]);
        if i >= 1 && candles[i - 1].is_valid() {
            signals.engulfing[i] = detect_engulfing(&candles[i - 1], &candles[i]);
        }
        if i >= 2 && candles[i - 2..i].iter().all(Candle::is_valid) {
            signals.star[i] = detect_star(&candles[i - 2], &candles[i - 1], &candles[i]);
        }
        if i >= 3 && candles[i - 3..i].iter().all(Candle::is_valid) {
            signals.three_line_strike[i] =
                detect_three_line_strike(&candles[i - 3], &candles[i - 2], &candles[i - 1], &candles[i]);
        }
    }

    signals
}

fn detect_doji(candle: &Candle) -> i8 {
    let total_shadow = candle.upper_shadow() + candle.lower_shadow();
    i8::from(total_shadow > 0.0 && candle.body() <= total_shadow * DOJI_TOLERANCE)
}

fn detect_hammer(candle: &Candle) -> i8 {
    let body = candle.body();
    let upper = candle.upper_shadow();
    let lower = candle.lower_shadow();
    let total = body + upper + lower;
    i8::from(
        total > 0.0
            && body / total <= HAMMER_BODY_RATIO
            && lower >= body * HAMMER_SHADOW_RATIO
            && upper <= body * HAMMER_UPPER_RATIO,
    )
}

fn detect_engulfing(prev: &Candle, curr: &Candle) -> i8 {
    let body_grew = curr.body() > prev.body();
    if prev.is_bearish()
        && curr.is_bullish()
        && curr.open <= prev.close
        && curr.close >= prev.open
        && body_grew
    {
        1
    } else if prev.is_bullish()
        && curr.is_bearish()
        && curr.open >= prev.close
        && curr.close <= prev.open
        && body_grew
    {
        -1
    } else {
        0
    }
}

fn detect_star(first: &Candle, middle: &Candle, curr: &Candle) -> i8 {
    let middle_shadow = middle.upper_shadow() + middle.lower_shadow();
    let small_middle = middle_shadow > 0.0 && middle.body() <= middle_shadow * DOJI_TOLERANCE;
    if !small_middle {
        return 0;
    }
    let first_midpoint = (first.open + first.close) / 2.0;
    if first.is_bearish() && curr.is_bullish() && curr.close > first_midpoint {
        1
    } else if first.is_bullish() && curr.is_bearish() && curr.close < first_midpoint {
        -1
    } else {
        0
    }
}

fn detect_three_line_strike(c1: &Candle, c2: &Candle, c3: &Candle, strike: &Candle) -> i8 {
    let bearish_run = c1.is_bearish()
        && c2.is_bearish()
        && c3.is_bearish()
        && c2.close < c1.close
        && c3.close < c2.close;
    if bearish_run && strike.is_bullish() && strike.close > c1.open {
        return 1;
    }
    let bullish_run = c1.is_bullish()
        && c2.is_bullish()
        && c3.is_bullish()
        && c2.close > c1.close
        && c3.close > c2.close;
    if bullish_run && strike.is_bearish() && strike.close < c1.open {
        return -1;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer_common::Timeframe;
    use chrono::{TimeZone, Utc};

    fn candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_opt(i as i64 * 3600, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 10.0,
        }
    }

    fn series(candles: Vec<Candle>) -> CandleSeries {
        CandleSeries::new("BTCUSDT", Timeframe::H1, candles)
    }

    #[test]
    fn doji_needs_tiny_body_and_real_shadows() {
        let signals = scan_all(&series(vec![
            candle(0, 100.0, 102.0, 98.0, 100.2),
            candle(1, 100.0, 103.0, 100.0, 102.8),
        ]));
        assert_eq!(signals.doji, vec![1, 0]);
    }

    #[test]
    fn hammer_requires_long_lower_shadow() {
        // Body 1, lower shadow 4, upper shadow 0.
        let hammer = candle(0, 100.0, 101.0, 96.0, 101.0);
        // Upper shadow violates the 0.1 × body cap.
        let not_hammer = candle(1, 100.0, 102.0, 96.0, 101.0);
        let signals = scan_all(&series(vec![hammer, not_hammer]));
        assert_eq!(signals.hammer, vec![1, 0]);
    }

    #[test]
    fn bullish_engulfing_contains_and_exceeds_prior_body() {
        let prev = candle(0, 102.0, 102.5, 99.5, 100.0);
        let curr = candle(1, 99.8, 103.5, 99.6, 102.9);
        let signals = scan_all(&series(vec![prev, curr]));
        assert_eq!(signals.engulfing, vec![0, 1]);
    }

    #[test]
    fn engulfing_is_antisymmetric_under_direction_flip() {
        let fixture = vec![candle(0, 102.0, 102.5, 99.5, 100.0), candle(1, 99.8, 103.5, 99.6, 102.9)];
        let flipped: Vec<Candle> = fixture
            .iter()
            .map(|c| Candle { open: c.close, close: c.open, ..*c })
            .collect();
        let forward = scan_all(&series(fixture));
        let mirrored = scan_all(&series(flipped));
        for (a, b) in forward.engulfing.iter().zip(mirrored.engulfing.iter()) {
            assert_eq!(*a, -*b);
        }
    }

    #[test]
    fn equal_body_does_not_engulf() {
        let prev = candle(0, 102.0, 102.5, 99.5, 100.0);
        let curr = candle(1, 100.0, 102.5, 99.5, 102.0);
        let signals = scan_all(&series(vec![prev, curr]));
        assert_eq!(signals.engulfing[1], 0);
    }

    #[test]
    fn morning_star_recovers_past_first_midpoint() {
        let first = candle(0, 106.0, 106.5, 99.5, 100.0);
        let star = candle(1, 99.9, 100.6, 99.2, 100.0);
        let third = candle(2, 100.2, 104.5, 100.0, 104.0);
        let signals = scan_all(&series(vec![first, star, third]));
        assert_eq!(signals.star, vec![0, 0, 1]);
    }

    #[test]
    fn bullish_three_line_strike_reverses_a_bear_run() {
        let signals = scan_all(&series(vec![
            candle(0, 106.0, 106.5, 103.5, 104.0),
            candle(1, 104.0, 104.5, 101.5, 102.0),
            candle(2, 102.0, 102.5, 99.5, 100.0),
            candle(3, 100.0, 107.5, 99.8, 107.0),
        ]));
        assert_eq!(signals.three_line_strike, vec![0, 0, 0, 1]);
    }

    #[test]
    fn broken_run_emits_nothing() {
        // Second close fails to extend the run.
        let signals = scan_all(&series(vec![
            candle(0, 106.0, 106.5, 103.5, 104.0),
            candle(1, 104.5, 105.5, 104.0, 104.5),
            candle(2, 104.0, 104.5, 99.5, 100.0),
            candle(3, 100.0, 107.5, 99.8, 107.0),
        ]));
        assert_eq!(signals.three_line_strike[3], 0);
    }
}
