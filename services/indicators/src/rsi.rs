//! Relative strength index with signal and divergence detection

use analyzer_common::{Computed, RSI_OVERBOUGHT, RSI_OVERSOLD, RSI_PERIOD};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-bar RSI output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RsiAnalysis {
    /// RSI value per bar, each in [0, 100]
    pub values: Vec<f64>,
    /// +1 oversold, −1 overbought, 0 otherwise
    pub signals: Vec<i8>,
    /// Price lower-low while RSI holds its low
    pub bullish_divergence: Vec<bool>,
    /// Price higher-high while RSI fails to follow
    pub bearish_divergence: Vec<bool>,
}

impl RsiAnalysis {
    fn neutral(len: usize) -> Self {
        Self {
            values: vec![50.0; len],
            signals: vec![0; len],
            bullish_divergence: vec![false; len],
            bearish_divergence: vec![false; len],
        }
    }

    /// RSI at the most recent bar, neutral 50 when empty.
    pub fn last_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(50.0)
    }

    /// Signal at the most recent bar.
    pub fn last_signal(&self) -> i8 {
        self.signals.last().copied().unwrap_or(0)
    }

    /// Bullish divergence at the most recent bar.
    pub fn last_bullish_divergence(&self) -> bool {
        self.bullish_divergence.last().copied().unwrap_or(false)
    }

    /// Bearish divergence at the most recent bar.
    pub fn last_bearish_divergence(&self) -> bool {
        self.bearish_divergence.last().copied().unwrap_or(false)
    }
}

/// RSI over close prices with the default 14/70/30 parameters.
pub fn compute_rsi(closes: &[f64]) -> Computed<RsiAnalysis> {
    compute_rsi_with(closes, RSI_PERIOD, RSI_OVERBOUGHT, RSI_OVERSOLD)
}

/// RSI with explicit period and thresholds.
///
/// Gain/loss averages are trailing means over up to `period` samples with a
/// minimum of one, so the indicator is defined from the first bar. A zero
/// loss average is replaced by a small ε; when the gain average is also
/// zero the same ε applies, which pins a constant-price series at the
/// neutral 50 instead of letting the ratio collapse to 0.
pub fn compute_rsi_with(
    closes: &[f64],
    period: usize,
    overbought: f64,
    oversold: f64,
) -> Computed<RsiAnalysis> {
    const EPSILON: f64 = 1e-5;

    if closes.is_empty() || period == 0 {
        warn!(bars = closes.len(), "rsi: empty input, returning neutral");
        return Computed::Neutral(RsiAnalysis::default());
    }

    let cleaned = forward_fill(closes);
    let Some(cleaned) = cleaned else {
        warn!("rsi: no finite closes, returning neutral");
        return Computed::Neutral(RsiAnalysis::neutral(closes.len()));
    };

    let n = cleaned.len();
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = cleaned[i] - cleaned[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    let mut analysis = RsiAnalysis {
        values: Vec::with_capacity(n),
        signals: Vec::with_capacity(n),
        bullish_divergence: vec![false; n],
        bearish_divergence: vec![false; n],
    };

    for i in 0..n {
        let start = (i + 1).saturating_sub(period);
        let window = i + 1 - start;
        let mut avg_gain = gains[start..=i].iter().sum::<f64>() / window as f64;
        let mut avg_loss = losses[start..=i].iter().sum::<f64>() / window as f64;
        if avg_loss == 0.0 {
            avg_loss = EPSILON;
            if avg_gain == 0.0 {
                avg_gain = EPSILON;
            }
        }
        let rsi = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        let rsi = if rsi.is_finite() { rsi.clamp(0.0, 100.0) } else { 50.0 };
        analysis.values.push(rsi);
        analysis.signals.push(if rsi < oversold {
            1
        } else if rsi > overbought {
            -1
        } else {
            0
        });
    }

    // Divergence needs a full trailing window of both price and RSI.
    for i in (period - 1)..n {
        let start = i + 1 - period;
        let price_window = &cleaned[start..=i];
        let rsi_window = &analysis.values[start..=i];

        let price_prior_max = max_of(&price_window[..period - 1]);
        let price_prior_min = min_of(&price_window[..period - 1]);
        let rsi_prior_max = max_of(&rsi_window[..period - 1]);
        let rsi_prior_min = min_of(&rsi_window[..period - 1]);

        let price_higher_high = price_window[period - 1] > price_prior_max;
        let rsi_lower_high = rsi_window[period - 1] < rsi_prior_max;
        analysis.bearish_divergence[i] = price_higher_high && rsi_lower_high;

        let price_lower_low = price_window[period - 1] < price_prior_min;
        let rsi_higher_low = rsi_window[period - 1] > rsi_prior_min;
        analysis.bullish_divergence[i] = price_lower_low && rsi_higher_low;
    }

    Computed::Value(analysis)
}

/// Replace non-finite values with the previous finite one. Returns `None`
/// when no finite value exists at all.
fn forward_fill(values: &[f64]) -> Option<Vec<f64>> {
    let first_finite = values.iter().copied().find(|v| v.is_finite())?;
    let mut last = first_finite;
    Some(
        values
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    last = v;
                }
                last
            })
            .collect(),
    )
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}
