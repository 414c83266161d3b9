//! Walk-forward backtest engine
//!
//! Replays the current trade signal over a historical window: at every
//! cursor with at least 50 trailing bars and 24 forward bars, a prediction
//! is built from the trailing slice only and scored against the forward
//! window. The trailing slice never includes the cursor bar, so no
//! prediction can see its own future.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use analyzer_common::constants::{MIN_DATA_POINTS, PREDICTION_HORIZON};
use analyzer_common::{Candle, CandleSeries};
use signal_aggregator::{Direction, TradeSignal};

use crate::conditions::{classify_trend, MarketConditions, Trend};
use crate::metrics::{AccuracyMetrics, ErrorAnalysis, RoiMetrics};

/// Long: +2% target, -1% stop. Short mirrors.
const TP_OFFSET: f64 = 0.02;
const SL_OFFSET: f64 = 0.01;

/// Whether the report carries real metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BacktestStatus {
    /// Metrics cover at least one scored prediction
    Complete,
    /// Too few bars in range, or no cursor produced a valid prediction;
    /// all metrics are the zero defaults
    InsufficientData,
}

/// Price levels a prediction commits to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedLevels {
    /// Last close of the trailing slice
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

/// One replayed prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub direction: Direction,
    pub confidence: f64,
    pub levels: PredictedLevels,
    pub market_conditions: MarketConditions,
}

/// What the forward window actually did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub trend: Trend,
}

/// One cursor's prediction, outcome and verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub timestamp: DateTime<Utc>,
    pub predicted: Prediction,
    pub actual: Outcome,
    pub success: bool,
}

/// Full backtest result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub status: BacktestStatus,
    pub predictions: Vec<PredictionRecord>,
    pub accuracy: AccuracyMetrics,
    pub roi: RoiMetrics,
    pub errors: ErrorAnalysis,
}

impl BacktestReport {
    /// Zero-metric default for windows that cannot be scored.
    pub fn insufficient_data() -> Self {
        Self {
            status: BacktestStatus::InsufficientData,
            predictions: Vec::new(),
            accuracy: AccuracyMetrics::default(),
            roi: RoiMetrics::default(),
            errors: ErrorAnalysis::default(),
        }
    }
}

/// Replay `current` over `[start, end]` and score every prediction.
///
/// The replayed direction is the signal's, defaulting to short when the
/// signal never chose one; confidence is carried through to the
/// high/low-confidence accuracy split.
pub fn analyze_historical_data(
    series: &CandleSeries,
    current: &TradeSignal,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BacktestReport {
    let period: Vec<Candle> = series
        .candles
        .iter()
        .filter(|c| c.timestamp >= start && c.timestamp <= end)
        .copied()
        .collect();
    if period.len() < MIN_DATA_POINTS {
        warn!(
            symbol = %series.symbol,
            bars = period.len(),
            required = MIN_DATA_POINTS,
            "backtest window too small"
        );
        return BacktestReport::insufficient_data();
    }

    let direction = match current.direction {
        Some(Direction::Long) => Direction::Long,
        _ => Direction::Short,
    };
    let confidence = current.confidence;

    let mut predictions = Vec::new();
    for i in 0..period.len() {
        if i + PREDICTION_HORIZON > period.len() {
            break;
        }
        let trailing = &period[..i];
        if trailing.len() < MIN_DATA_POINTS {
            continue;
        }
        let predicted = build_prediction(trailing, direction, confidence);
        let actual = observe_outcome(&period[i..i + PREDICTION_HORIZON]);
        let success = evaluate(&predicted, &actual);
        predictions.push(PredictionRecord {
            timestamp: period[i].timestamp,
            predicted,
            actual,
            success,
        });
    }

    if predictions.is_empty() {
        warn!(symbol = %series.symbol, "no cursor produced a scoreable prediction");
        return BacktestReport::insufficient_data();
    }
    debug!(symbol = %series.symbol, predictions = predictions.len(), "backtest scored");

    BacktestReport {
        status: BacktestStatus::Complete,
        accuracy: AccuracyMetrics::from_records(&predictions),
        roi: RoiMetrics::from_records(&predictions),
        errors: ErrorAnalysis::from_records(&predictions),
        predictions,
    }
}

fn build_prediction(trailing: &[Candle], direction: Direction, confidence: f64) -> Prediction {
    let entry = trailing[trailing.len() - 1].close;
    let levels = match direction {
        Direction::Long => PredictedLevels {
            entry,
            take_profit: entry * (1.0 + TP_OFFSET),
            stop_loss: entry * (1.0 - SL_OFFSET),
        },
        Direction::Short => PredictedLevels {
            entry,
            take_profit: entry * (1.0 - TP_OFFSET),
            stop_loss: entry * (1.0 + SL_OFFSET),
        },
    };
    Prediction {
        direction,
        confidence,
        levels,
        market_conditions: MarketConditions::from_bars(trailing),
    }
}

fn observe_outcome(forward: &[Candle]) -> Outcome {
    Outcome {
        high: forward.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
        low: forward.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
        close: forward[forward.len() - 1].close,
        trend: classify_trend(forward),
    }
}

/// Success needs the target reached AND the stop never breached.
fn evaluate(predicted: &Prediction, actual: &Outcome) -> bool {
    match predicted.direction {
        Direction::Long => {
            actual.high >= predicted.levels.take_profit && actual.low >= predicted.levels.stop_loss
        }
        Direction::Short => {
            actual.low <= predicted.levels.take_profit && actual.high <= predicted.levels.stop_loss
        }
    }
}
