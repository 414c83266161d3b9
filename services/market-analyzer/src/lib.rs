//! Market data access and order-book analysis
//!
//! Sits between the external data provider and the analysis pipeline:
//! caches candle series per (symbol, timeframe), analyzes order-book depth,
//! fans the volume-profile histogram out across timeframes and blends
//! multi-timeframe sentiment.

pub mod analyzer;
pub mod cache;
pub mod depth;
pub mod sentiment;

pub use analyzer::MarketAnalyzer;
pub use cache::{CachedSeries, CandleCache, CandleStore, JsonFileStore, MemoryStore};
pub use depth::{analyze_depth, DepthAnalysis, LiquidityZone};
pub use sentiment::{blend_sentiment, MarketSentiment, SentimentLabel};
