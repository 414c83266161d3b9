//! Complete multi-timeframe analysis pipeline
//!
//! One run moves through fetch, per-timeframe analysis, sentiment, depth
//! and volume views, risk scoring and signal generation. Every stage after
//! the fetch degrades to a neutral or missing piece; the only fatal outcome
//! is a symbol with no usable candle data on any timeframe.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use analyzer_common::{AnalysisError, Computed, MarketDataProvider, Timeframe};
use indicators::VolumeProfile;
use market_analyzer::{
    CandleCache, CandleStore, DepthAnalysis, MarketAnalyzer, MarketSentiment, MemoryStore,
    SentimentLabel,
};
use risk_scorer::{
    calculate_risk_metrics, compare_trading_pairs, PairRisk, RiskMetrics, RiskWeights,
};

use crate::snapshot::TechnicalSnapshot;
use crate::voting::{vote, TimeframeAction, TimeframeSignal};

/// Bull or bear ratio a direction must clear
const DIRECTION_RATIO: f64 = 0.6;
/// Stop placed just past the reference support/resistance level
const STOP_OFFSET: f64 = 0.005;

/// Recommended position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

/// Aggregated trade recommendation for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Blended sentiment label, when sentiment ran
    pub overall_sentiment: Option<SentimentLabel>,
    /// 0-100, already risk-adjusted
    pub confidence: f64,
    /// Chosen direction, when one side's weighted ratio cleared 0.6
    pub direction: Option<Direction>,
    /// Order-book mid price, only when stop and target both exist
    pub entry: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// Per-timeframe votes that fed the decision
    pub timeframe_signals: FxHashMap<Timeframe, TimeframeSignal>,
    /// 0-1 capital fraction, when risk metrics were available
    pub risk_adjusted_size: Option<f64>,
}

impl TradeSignal {
    fn empty() -> Self {
        Self {
            overall_sentiment: None,
            confidence: 0.0,
            direction: None,
            entry: None,
            stop_loss: None,
            take_profit: None,
            timeframe_signals: FxHashMap::default(),
            risk_adjusted_size: None,
        }
    }
}

/// Everything one analysis run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteAnalysis {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    /// 24h-ticker last price, falling back to the freshest cached close
    pub current_price: Option<f64>,
    pub timeframes: FxHashMap<Timeframe, TechnicalSnapshot>,
    pub sentiment: MarketSentiment,
    pub depth: Computed<DepthAnalysis>,
    pub volume_profiles: FxHashMap<Timeframe, Computed<VolumeProfile>>,
    /// Present only when daily candles were available
    pub risk: Option<RiskMetrics>,
    pub signal: TradeSignal,
}

/// Multi-pair run with a cross-pair risk ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPairAnalysis {
    pub analyses: FxHashMap<String, CompleteAnalysis>,
    /// Pairs with risk metrics, safest first
    pub ranked: Vec<PairRisk>,
}

/// The analysis pipeline: market views in, trade signals out
pub struct SignalAggregator<S = MemoryStore> {
    analyzer: MarketAnalyzer<S>,
    weights: RiskWeights,
}

impl SignalAggregator<MemoryStore> {
    /// Aggregator with an in-memory cache and default risk weights.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_analyzer(MarketAnalyzer::new(provider), RiskWeights::default())
    }
}

impl<S: CandleStore> SignalAggregator<S> {
    pub fn with_analyzer(analyzer: MarketAnalyzer<S>, weights: RiskWeights) -> Self {
        Self { analyzer, weights }
    }

    /// Aggregator backed by an explicit cache.
    pub fn with_cache(
        provider: Arc<dyn MarketDataProvider>,
        cache: CandleCache<S>,
        weights: RiskWeights,
    ) -> Self {
        Self::with_analyzer(MarketAnalyzer::with_cache(provider, cache), weights)
    }

    /// Run the full pipeline for one symbol.
    ///
    /// Default timeframes are 15m, 1h, 4h and 1d. Timeframes that fail to
    /// fetch or analyze are dropped; the run fails only when none survive.
    pub async fn perform_complete_analysis(
        &self,
        symbol: &str,
        timeframes: Option<&[Timeframe]>,
    ) -> Result<CompleteAnalysis, AnalysisError> {
        let timeframes = timeframes.unwrap_or(&Timeframe::DEFAULT_ANALYSIS);
        info!(symbol, ?timeframes, "starting complete analysis");

        let candles = self.analyzer.get_candles(symbol, timeframes).await;
        if candles.is_empty() {
            return Err(AnalysisError::NoMarketData(symbol.to_string()));
        }

        let mut snapshots = FxHashMap::default();
        for (timeframe, series) in &candles {
            match TechnicalSnapshot::from_series(series) {
                Some(snapshot) => {
                    snapshots.insert(*timeframe, snapshot);
                }
                None => warn!(symbol, timeframe = %timeframe, "timeframe analysis skipped"),
            }
        }
        if snapshots.is_empty() {
            return Err(AnalysisError::NoMarketData(symbol.to_string()));
        }

        let sentiment = self.analyzer.market_sentiment(symbol).await;
        let depth = self.analyzer.analyze_depth(symbol).await;
        let volume_profiles = self.analyzer.analyze_volume_profile(symbol, None, None).await;

        let risk = candles.get(&Timeframe::D1).map(|daily| {
            let profile = volume_profiles
                .get(&Timeframe::D1)
                .cloned()
                .unwrap_or_else(|| Computed::Neutral(VolumeProfile::default()));
            calculate_risk_metrics(daily, &depth, &profile, &self.weights)
        });
        if risk.is_none() {
            warn!(symbol, "no daily candles, skipping risk metrics");
        }

        let signal = generate_trade_signal(&snapshots, &sentiment, &depth, risk.as_ref());

        let current_price = match self.analyzer.ticker_24h(symbol).await {
            Some(ticker) => Some(ticker.last_price),
            None => timeframes
                .iter()
                .find_map(|tf| candles.get(tf).and_then(|s| s.last_close())),
        };

        info!(
            symbol,
            direction = ?signal.direction,
            confidence = signal.confidence,
            "analysis complete"
        );
        Ok(CompleteAnalysis {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            current_price,
            timeframes: snapshots,
            sentiment,
            depth,
            volume_profiles,
            risk,
            signal,
        })
    }

    /// Analyze several symbols and rank them by composite risk.
    ///
    /// Symbols whose run fails are skipped; the ranking covers every pair
    /// that produced risk metrics.
    pub async fn analyze_multiple_pairs(
        &self,
        symbols: &[&str],
        timeframes: Option<&[Timeframe]>,
    ) -> MultiPairAnalysis {
        let mut analyses = FxHashMap::default();
        for &symbol in symbols {
            match self.perform_complete_analysis(symbol, timeframes).await {
                Ok(analysis) => {
                    analyses.insert(symbol.to_string(), analysis);
                }
                Err(e) => warn!(symbol, error = %e, "skipping pair"),
            }
        }
        let ranked = compare_trading_pairs(
            analyses
                .iter()
                .filter_map(|(symbol, a)| a.risk.as_ref().map(|r| (symbol.as_str(), r))),
        );
        MultiPairAnalysis { analyses, ranked }
    }
}

/// Fold per-timeframe votes, sentiment, depth and risk into one signal.
pub fn generate_trade_signal(
    snapshots: &FxHashMap<Timeframe, TechnicalSnapshot>,
    sentiment: &MarketSentiment,
    depth: &Computed<DepthAnalysis>,
    risk: Option<&RiskMetrics>,
) -> TradeSignal {
    let mut signal = TradeSignal::empty();
    signal.overall_sentiment = Some(sentiment.label);

    let mut bullish = 0.0;
    let mut bearish = 0.0;
    let mut total = 0.0;
    for (timeframe, snapshot) in snapshots {
        let tf_signal = vote(snapshot);
        let weight = timeframe.signal_weight();
        match tf_signal.action {
            Some(TimeframeAction::Buy) => bullish += weight,
            Some(TimeframeAction::Sell) => bearish += weight,
            None => {}
        }
        total += weight;
        signal.timeframe_signals.insert(*timeframe, tf_signal);
    }

    if total > 0.0 {
        let bull_ratio = bullish / total;
        let bear_ratio = bearish / total;
        if bull_ratio > DIRECTION_RATIO {
            signal.direction = Some(Direction::Long);
            signal.confidence = bull_ratio * 100.0;
        } else if bear_ratio > DIRECTION_RATIO {
            signal.direction = Some(Direction::Short);
            signal.confidence = bear_ratio * 100.0;
        }
    }

    if let Some(risk) = risk {
        signal.confidence *= 1.0 - risk.overall_risk_score / 200.0;
        signal.risk_adjusted_size = Some(1.0 - risk.overall_risk_score / 100.0);
    }

    if let Some(direction) = signal.direction {
        if !depth.is_neutral() {
            place_levels(&mut signal, direction, depth.value().mid_price, snapshots);
        }
    }

    signal
}

/// Entry, stop and target from cross-timeframe support/resistance around
/// the current price. Both a support below and a resistance above must
/// exist, whichever the direction; otherwise all three stay unset.
fn place_levels(
    signal: &mut TradeSignal,
    direction: Direction,
    current_price: f64,
    snapshots: &FxHashMap<Timeframe, TechnicalSnapshot>,
) {
    let mut max_support = f64::NEG_INFINITY;
    let mut min_resistance = f64::INFINITY;
    let mut any_support = false;
    let mut any_resistance = false;
    for snapshot in snapshots.values() {
        for support in snapshot.support_resistance.supports_below(current_price) {
            max_support = max_support.max(support);
            any_support = true;
        }
        for resistance in snapshot.support_resistance.resistances_above(current_price) {
            min_resistance = min_resistance.min(resistance);
            any_resistance = true;
        }
    }
    if !(any_support && any_resistance) {
        return;
    }

    signal.entry = Some(current_price);
    match direction {
        Direction::Long => {
            signal.stop_loss = Some(max_support * (1.0 - STOP_OFFSET));
            signal.take_profit = Some(min_resistance * (1.0 + STOP_OFFSET));
        }
        Direction::Short => {
            signal.stop_loss = Some(min_resistance * (1.0 + STOP_OFFSET));
            signal.take_profit = Some(max_support * (1.0 - STOP_OFFSET));
        }
    }
}
