//! Per-timeframe directional voting
//!
//! Points: aligned EMAs (9 > 20 > 50 or the reverse) are worth 30, an RSI
//! extreme confirmed by divergence 25, each active pattern 15. A timeframe
//! emits a signal only when the winning side holds at least 30 points and
//! strictly beats the losing side.

use serde::{Deserialize, Serialize};

use analyzer_common::constants::{RSI_OVERBOUGHT, RSI_OVERSOLD};

use crate::snapshot::TechnicalSnapshot;

const EMA_POINTS: u32 = 30;
const RSI_POINTS: u32 = 25;
const PATTERN_POINTS: u32 = 15;
const SIGNAL_THRESHOLD: u32 = 30;

/// Per-timeframe action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeframeAction {
    Buy,
    Sell,
}

/// One timeframe's vote with its supporting reasons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSignal {
    /// Winning action, if any side cleared the threshold
    pub action: Option<TimeframeAction>,
    /// Points held by the winning side
    pub strength: u32,
    /// Human-readable grounds for the vote
    pub reasons: Vec<String>,
}

impl TimeframeSignal {
    fn none() -> Self {
        Self { action: None, strength: 0, reasons: Vec::new() }
    }
}

/// Vote on one timeframe snapshot.
pub fn vote(snapshot: &TechnicalSnapshot) -> TimeframeSignal {
    let mut signal = TimeframeSignal::none();
    let mut bullish = 0u32;
    let mut bearish = 0u32;

    if let (Some(&e9), Some(&e20), Some(&e50)) = (
        snapshot.emas.get(&9),
        snapshot.emas.get(&20),
        snapshot.emas.get(&50),
    ) {
        if e9 > e20 && e20 > e50 {
            bullish += EMA_POINTS;
            signal.reasons.push("Bullish EMA alignment".to_string());
        } else if e9 < e20 && e20 < e50 {
            bearish += EMA_POINTS;
            signal.reasons.push("Bearish EMA alignment".to_string());
        }
    }

    if snapshot.rsi.value < RSI_OVERSOLD && snapshot.rsi.bullish_divergence {
        bullish += RSI_POINTS;
        signal.reasons.push("RSI oversold with bullish divergence".to_string());
    } else if snapshot.rsi.value > RSI_OVERBOUGHT && snapshot.rsi.bearish_divergence {
        bearish += RSI_POINTS;
        signal.reasons.push("RSI overbought with bearish divergence".to_string());
    }

    for (pattern, value) in &snapshot.patterns {
        if *value == 1 {
            bullish += PATTERN_POINTS;
            signal.reasons.push(format!("Bullish {pattern} pattern"));
        } else if *value == -1 {
            bearish += PATTERN_POINTS;
            signal.reasons.push(format!("Bearish {pattern} pattern"));
        }
    }

    if bullish > bearish && bullish >= SIGNAL_THRESHOLD {
        signal.action = Some(TimeframeAction::Buy);
        signal.strength = bullish;
    } else if bearish > bullish && bearish >= SIGNAL_THRESHOLD {
        signal.action = Some(TimeframeAction::Sell);
        signal.strength = bearish;
    }

    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{RsiSummary, VolumeSummary};
    use analyzer_common::Timeframe;
    use indicators::SupportResistance;
    use rustc_hash::FxHashMap;

    fn snapshot(e9: f64, e20: f64, e50: f64) -> TechnicalSnapshot {
        let mut emas = FxHashMap::default();
        emas.insert(9, e9);
        emas.insert(20, e20);
        emas.insert(50, e50);
        emas.insert(200, 100.0);
        TechnicalSnapshot {
            timeframe: Timeframe::H1,
            emas,
            rsi: RsiSummary {
                value: 50.0,
                signal: 0,
                bullish_divergence: false,
                bearish_divergence: false,
            },
            support_resistance: SupportResistance::default(),
            patterns: vec![("doji".to_string(), 0), ("engulfing".to_string(), 0)],
            volume: VolumeSummary { poc: 100.0, value_area_high: 101.0, value_area_low: 99.0 },
        }
    }

    #[test]
    fn ema_alignment_alone_clears_the_threshold() {
        let signal = vote(&snapshot(103.0, 102.0, 101.0));
        assert_eq!(signal.action, Some(TimeframeAction::Buy));
        assert_eq!(signal.strength, 30);
        assert_eq!(signal.reasons, vec!["Bullish EMA alignment"]);
    }

    #[test]
    fn bearish_alignment_votes_sell() {
        let signal = vote(&snapshot(101.0, 102.0, 103.0));
        assert_eq!(signal.action, Some(TimeframeAction::Sell));
        assert_eq!(signal.strength, 30);
    }

    #[test]
    fn rsi_extreme_needs_the_divergence() {
        let mut flat = snapshot(100.0, 100.0, 100.0);
        flat.rsi.value = 25.0;
        assert_eq!(vote(&flat).action, None);

        flat.rsi.bullish_divergence = true;
        let signal = vote(&flat);
        // 25 points alone stay under the 30-point threshold.
        assert_eq!(signal.action, None);
        assert_eq!(signal.reasons, vec!["RSI oversold with bullish divergence"]);
    }

    #[test]
    fn patterns_stack_with_the_rsi_vote() {
        let mut s = snapshot(100.0, 100.0, 100.0);
        s.rsi.value = 25.0;
        s.rsi.bullish_divergence = true;
        s.patterns = vec![("hammer".to_string(), 1)];
        let signal = vote(&s);
        assert_eq!(signal.action, Some(TimeframeAction::Buy));
        assert_eq!(signal.strength, 40);
    }

    #[test]
    fn opposing_sides_cancel_to_no_signal() {
        // Bullish EMAs (30) against two bearish patterns (30): tied sides
        // never emit.
        let mut s = snapshot(103.0, 102.0, 101.0);
        s.patterns = vec![("engulfing".to_string(), -1), ("star".to_string(), -1)];
        assert_eq!(vote(&s).action, None);
    }
}
