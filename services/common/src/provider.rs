//! External market-data boundary
//!
//! The exchange client lives outside this workspace; the analysis core only
//! sees this trait. The provider owns timeout and retry policy; calls here
//! are awaited sequentially with no internal deadline.

use async_trait::async_trait;

use crate::errors::AnalysisError;
use crate::types::{CandleSeries, DepthSnapshot, Timeframe};

/// 24h rolling ticker statistics, optional enrichment for sentiment
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker24h {
    /// Percent price change over the last 24 hours
    pub price_change_percent: f64,
    /// Last traded price
    pub last_price: f64,
    /// Volume-weighted average price over the window
    pub weighted_avg_price: f64,
}

/// Supplies candles, depth and ticker data for the analysis pipeline.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch up to `limit` most recent candles for one symbol+timeframe.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries, AnalysisError>;

    /// Fetch an order-book snapshot with up to `levels` per side.
    async fn fetch_depth(&self, symbol: &str, levels: usize)
    -> Result<DepthSnapshot, AnalysisError>;

    /// Fetch 24h ticker statistics. `Ok(None)` when the venue does not
    /// serve them; callers degrade to close-price fallbacks.
    async fn fetch_ticker_24h(&self, symbol: &str) -> Result<Option<Ticker24h>, AnalysisError>;
}
