//! Multi-timeframe market sentiment
//!
//! Per-timeframe score = half price-change component, half volume-trend
//! component. Timeframe scores are blended with the configured weights
//! (1h = 0.2, 4h = 0.3, 1d = 0.5), then combined 70/30 with order-book
//! pressure into one signed score in [-1, 1].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use analyzer_common::{CandleSeries, Timeframe};

use crate::depth::DepthAnalysis;

/// Percent price change treated as full strength (score saturates)
const PRICE_SATURATION_PCT: f64 = 10.0;
/// Candle share of the final blend; the rest is order-book pressure
const CANDLE_BLEND: f64 = 0.7;

/// Five-level sentiment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    VeryBearish,
    Bearish,
    Neutral,
    Bullish,
    VeryBullish,
}

impl SentimentLabel {
    /// Classify a blended score.
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            Self::VeryBullish
        } else if score > 0.1 {
            Self::Bullish
        } else if score >= -0.1 {
            Self::Neutral
        } else if score >= -0.5 {
            Self::Bearish
        } else {
            Self::VeryBearish
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryBearish => "Very Bearish",
            Self::Bearish => "Bearish",
            Self::Neutral => "Neutral",
            Self::Bullish => "Bullish",
            Self::VeryBullish => "Very Bullish",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blended sentiment for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSentiment {
    /// Final blended score in [-1, 1]
    pub score: f64,
    /// Five-level label for the score
    pub label: SentimentLabel,
    /// Weighted candle-side score before the book blend
    pub candle_score: f64,
    /// Order-book pressure score, (buy - sell) / 100
    pub book_score: f64,
    /// Raw per-timeframe scores that fed the candle side
    pub per_timeframe: FxHashMap<Timeframe, f64>,
}

impl MarketSentiment {
    /// Neutral sentiment for when no candle data is available.
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            candle_score: 0.0,
            book_score: 0.0,
            per_timeframe: FxHashMap::default(),
        }
    }
}

/// Score one candle series in [-1, 1].
///
/// Price component: percent change over the series, saturating at 10%.
/// Volume component: sign of recent-half mean volume vs prior-half mean.
pub fn timeframe_score(series: &CandleSeries) -> f64 {
    let closes = series.closes();
    let price_component = match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => {
            let change_pct = (last - first) / first * 100.0;
            (change_pct / PRICE_SATURATION_PCT).clamp(-1.0, 1.0)
        }
        _ => 0.0,
    };

    let volumes = series.volumes();
    let volume_component = if volumes.len() < 2 {
        0.0
    } else {
        let mid = volumes.len() / 2;
        let prior = mean(&volumes[..mid]);
        let recent = mean(&volumes[mid..]);
        if recent > prior {
            1.0
        } else if recent < prior {
            -1.0
        } else {
            0.0
        }
    };

    0.5 * price_component + 0.5 * volume_component
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}

/// Blend per-timeframe candle scores with order-book pressure.
///
/// Missing timeframes drop out of the weighted average; with no candle data
/// at all the result is neutral regardless of the book.
pub fn blend_sentiment(
    candles: &FxHashMap<Timeframe, CandleSeries>,
    depth: Option<&DepthAnalysis>,
) -> MarketSentiment {
    let mut per_timeframe = FxHashMap::default();
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for timeframe in Timeframe::SENTIMENT {
        let Some(series) = candles.get(&timeframe) else { continue };
        if series.is_empty() {
            continue;
        }
        let score = timeframe_score(series);
        per_timeframe.insert(timeframe, score);
        weighted += score * timeframe.sentiment_weight();
        total_weight += timeframe.sentiment_weight();
    }
    if total_weight == 0.0 {
        return MarketSentiment::neutral();
    }
    let candle_score = weighted / total_weight;
    let book_score = depth
        .map(|d| (d.buy_pressure - d.sell_pressure) / 100.0)
        .unwrap_or(0.0);
    let score = CANDLE_BLEND * candle_score + (1.0 - CANDLE_BLEND) * book_score;

    MarketSentiment {
        score,
        label: SentimentLabel::from_score(score),
        candle_score,
        book_score,
        per_timeframe,
    }
}
