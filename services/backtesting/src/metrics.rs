//! Backtest metric aggregation
//!
//! All percentages are 0-100. Default-constructed metrics are the zero
//! shape reports carry when nothing could be scored.

use serde::{Deserialize, Serialize};

use analyzer_common::constants::HIGH_CONFIDENCE_THRESHOLD;
use signal_aggregator::Direction;

use crate::conditions::Trend;
use crate::engine::PredictionRecord;

/// Failure counts as volatility above this annualized level
const HIGH_VOLATILITY: f64 = 0.5;
/// A close this share of the tp distance from entry reads as a false
/// breakout
const FALSE_BREAKOUT_FRACTION: f64 = 0.1;

/// Hit rates across direction and confidence splits
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub overall_accuracy: f64,
    pub long_accuracy: f64,
    pub short_accuracy: f64,
    pub high_confidence_accuracy: f64,
    pub low_confidence_accuracy: f64,
}

impl AccuracyMetrics {
    pub fn from_records(records: &[PredictionRecord]) -> Self {
        let rate = |filter: &dyn Fn(&&PredictionRecord) -> bool| -> f64 {
            let subset: Vec<&PredictionRecord> = records.iter().filter(filter).collect();
            if subset.is_empty() {
                return 0.0;
            }
            let hits = subset.iter().filter(|r| r.success).count();
            hits as f64 / subset.len() as f64 * 100.0
        };
        Self {
            overall_accuracy: rate(&|_| true),
            long_accuracy: rate(&|r| r.predicted.direction == Direction::Long),
            short_accuracy: rate(&|r| r.predicted.direction == Direction::Short),
            high_confidence_accuracy: rate(&|r| {
                r.predicted.confidence >= HIGH_CONFIDENCE_THRESHOLD
            }),
            low_confidence_accuracy: rate(&|r| r.predicted.confidence < HIGH_CONFIDENCE_THRESHOLD),
        }
    }
}

/// Percent-move return metrics
///
/// A win realizes the tp move, a loss the sl move, both relative to entry.
/// `total_roi` is the winning percent sum minus the absolute losing
/// percent sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiMetrics {
    pub total_roi: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
}

impl RoiMetrics {
    pub fn from_records(records: &[PredictionRecord]) -> Self {
        let mut wins = Vec::new();
        let mut losses = Vec::new();
        for record in records {
            let levels = &record.predicted.levels;
            if record.success {
                wins.push((levels.take_profit - levels.entry) / levels.entry * 100.0);
            } else {
                losses.push((levels.stop_loss - levels.entry) / levels.entry * 100.0);
            }
        }
        let total_wins: f64 = wins.iter().sum();
        let total_losses: f64 = losses.iter().sum::<f64>().abs();
        Self {
            total_roi: total_wins - total_losses,
            avg_win: mean(&wins),
            avg_loss: mean(&losses),
            profit_factor: if total_losses > 0.0 { total_wins / total_losses } else { 0.0 },
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}

/// Failure-mode breakdown, each as a percentage of failed predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub high_volatility_fails: f64,
    pub trend_misalignment: f64,
    pub false_breakouts: f64,
    pub stop_loss_hits: f64,
}

impl ErrorAnalysis {
    pub fn from_records(records: &[PredictionRecord]) -> Self {
        let failures: Vec<&PredictionRecord> = records.iter().filter(|r| !r.success).collect();
        if failures.is_empty() {
            return Self::default();
        }

        let mut high_volatility = 0usize;
        let mut misaligned = 0usize;
        let mut false_breakouts = 0usize;
        let mut stop_hits = 0usize;
        for record in &failures {
            let predicted = &record.predicted;
            let actual = &record.actual;
            if predicted.market_conditions.volatility > HIGH_VOLATILITY {
                high_volatility += 1;
            }
            let against_trend = matches!(
                (predicted.direction, actual.trend),
                (Direction::Long, Trend::Downtrend) | (Direction::Short, Trend::Uptrend)
            );
            if against_trend {
                misaligned += 1;
            }
            let tp_distance = (predicted.levels.take_profit - predicted.levels.entry).abs();
            if (actual.close - predicted.levels.entry).abs() < tp_distance * FALSE_BREAKOUT_FRACTION
            {
                false_breakouts += 1;
            }
            let stopped = match predicted.direction {
                Direction::Long => actual.low <= predicted.levels.stop_loss,
                Direction::Short => actual.high >= predicted.levels.stop_loss,
            };
            if stopped {
                stop_hits += 1;
            }
        }

        let pct = |count: usize| count as f64 / failures.len() as f64 * 100.0;
        Self {
            high_volatility_fails: pct(high_volatility),
            trend_misalignment: pct(misaligned),
            false_breakouts: pct(false_breakouts),
            stop_loss_hits: pct(stop_hits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{MarketConditions, VolumeRegime};
    use crate::engine::{Outcome, PredictedLevels, Prediction};
    use chrono::Utc;

    fn record(direction: Direction, confidence: f64, success: bool) -> PredictionRecord {
        let levels = match direction {
            Direction::Long => {
                PredictedLevels { entry: 100.0, take_profit: 102.0, stop_loss: 99.0 }
            }
            Direction::Short => {
                PredictedLevels { entry: 100.0, take_profit: 98.0, stop_loss: 101.0 }
            }
        };
        PredictionRecord {
            timestamp: Utc::now(),
            predicted: Prediction {
                direction,
                confidence,
                levels,
                market_conditions: MarketConditions {
                    volatility: 0.2,
                    trend: Trend::Unknown,
                    volume_regime: VolumeRegime::Normal,
                },
            },
            actual: Outcome {
                high: if success { 102.5 } else { 101.0 },
                low: 99.5,
                close: 101.0,
                trend: Trend::Unknown,
            },
            success,
        }
    }

    #[test]
    fn accuracy_splits_by_direction_and_confidence() {
        let records = vec![
            record(Direction::Long, 80.0, true),
            record(Direction::Long, 80.0, false),
            record(Direction::Short, 60.0, true),
        ];
        let accuracy = AccuracyMetrics::from_records(&records);
        assert!((accuracy.overall_accuracy - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(accuracy.long_accuracy, 50.0);
        assert_eq!(accuracy.short_accuracy, 100.0);
        assert_eq!(accuracy.high_confidence_accuracy, 50.0);
        assert_eq!(accuracy.low_confidence_accuracy, 100.0);
    }

    #[test]
    fn roi_nets_wins_against_losses() {
        let records = vec![
            record(Direction::Long, 80.0, true),
            record(Direction::Long, 80.0, true),
            record(Direction::Long, 80.0, false),
        ];
        let roi = RoiMetrics::from_records(&records);
        assert!((roi.avg_win - 2.0).abs() < 1e-9);
        assert!((roi.avg_loss + 1.0).abs() < 1e-9);
        assert!((roi.total_roi - 3.0).abs() < 1e-9);
        assert!((roi.profit_factor - 4.0).abs() < 1e-9);
    }

    #[test]
    fn all_wins_has_zero_profit_factor_denominator() {
        let records = vec![record(Direction::Long, 80.0, true)];
        let roi = RoiMetrics::from_records(&records);
        assert_eq!(roi.profit_factor, 0.0);
        assert!((roi.total_roi - 2.0).abs() < 1e-9);
    }

    #[test]
    fn error_patterns_cover_failures_only() {
        let mut stopped = record(Direction::Long, 80.0, false);
        stopped.actual.low = 98.5;
        stopped.predicted.market_conditions.volatility = 0.8;
        let records = vec![record(Direction::Long, 80.0, true), stopped];
        let errors = ErrorAnalysis::from_records(&records);
        assert_eq!(errors.stop_loss_hits, 100.0);
        assert_eq!(errors.high_volatility_fails, 100.0);
        assert_eq!(errors.trend_misalignment, 0.0);
    }

    #[test]
    fn no_failures_is_the_zero_shape() {
        let records = vec![record(Direction::Long, 80.0, true)];
        assert_eq!(ErrorAnalysis::from_records(&records), ErrorAnalysis::default());
    }
}
