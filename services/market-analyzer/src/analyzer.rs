//! Market analyzer facade
//!
//! Owns the provider handle and the candle cache, and exposes the market
//! views the aggregator consumes: cached candles, depth analysis,
//! per-timeframe volume profiles and blended sentiment. Every call degrades
//! to a neutral or partial result instead of failing.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use analyzer_common::constants::{DEFAULT_DEPTH_LEVELS, DEPTH_PROFILE_BINS};
use analyzer_common::{
    CandleSeries, Computed, MarketDataProvider, Ticker24h, Timeframe,
};
use indicators::volume_profile::compute_volume_profile_with;
use indicators::VolumeProfile;

use crate::cache::{CandleCache, CandleStore, MemoryStore};
use crate::depth::{analyze_depth, DepthAnalysis};
use crate::sentiment::{blend_sentiment, MarketSentiment};

/// Market data access and order-book analysis for one provider
pub struct MarketAnalyzer<S = MemoryStore> {
    provider: Arc<dyn MarketDataProvider>,
    cache: CandleCache<S>,
}

impl MarketAnalyzer<MemoryStore> {
    /// Analyzer with an in-memory cache and the default TTL.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_cache(provider, CandleCache::new(MemoryStore::new()))
    }
}

impl<S: CandleStore> MarketAnalyzer<S> {
    pub fn with_cache(provider: Arc<dyn MarketDataProvider>, cache: CandleCache<S>) -> Self {
        Self { provider, cache }
    }

    /// Cached candle series per timeframe; failed timeframes are absent.
    pub async fn get_candles(
        &self,
        symbol: &str,
        timeframes: &[Timeframe],
    ) -> FxHashMap<Timeframe, CandleSeries> {
        self.cache.get_candles(self.provider.as_ref(), symbol, timeframes).await
    }

    /// Fetch and analyze the current order book.
    ///
    /// A fetch failure is reported as a neutral analysis, same as an
    /// unusable snapshot.
    pub async fn analyze_depth(&self, symbol: &str) -> Computed<DepthAnalysis> {
        match self.provider.fetch_depth(symbol, DEFAULT_DEPTH_LEVELS).await {
            Ok(snapshot) => analyze_depth(&snapshot),
            Err(e) => {
                warn!(symbol, error = %e, "depth fetch failed");
                Computed::Neutral(DepthAnalysis::neutral())
            }
        }
    }

    /// Volume profile per timeframe, default [1h, 4h, 1d] with 50 bins.
    pub async fn analyze_volume_profile(
        &self,
        symbol: &str,
        timeframes: Option<&[Timeframe]>,
        num_bins: Option<usize>,
    ) -> FxHashMap<Timeframe, Computed<VolumeProfile>> {
        let timeframes = timeframes.unwrap_or(&Timeframe::SENTIMENT);
        let num_bins = num_bins.unwrap_or(DEPTH_PROFILE_BINS);
        let candles = self.get_candles(symbol, timeframes).await;
        let mut profiles = FxHashMap::default();
        for (timeframe, series) in &candles {
            debug!(symbol, timeframe = %timeframe, bars = series.len(), "building volume profile");
            profiles.insert(*timeframe, compute_volume_profile_with(series, num_bins));
        }
        profiles
    }

    /// Blended multi-timeframe sentiment for one symbol.
    pub async fn market_sentiment(&self, symbol: &str) -> MarketSentiment {
        let candles = self.get_candles(symbol, &Timeframe::SENTIMENT).await;
        let depth = self.analyze_depth(symbol).await;
        blend_sentiment(&candles, Some(depth.value()))
    }

    /// 24h ticker when the venue serves one. Errors degrade to `None`;
    /// callers fall back to the latest cached close.
    pub async fn ticker_24h(&self, symbol: &str) -> Option<Ticker24h> {
        match self.provider.fetch_ticker_24h(symbol).await {
            Ok(ticker) => ticker,
            Err(e) => {
                debug!(symbol, error = %e, "ticker fetch failed, falling back to close");
                None
            }
        }
    }
}
