//! Multi-timeframe signal aggregation
//!
//! Builds per-timeframe technical snapshots, lets each timeframe vote on a
//! direction, weighs the votes by horizon and folds sentiment, order-book
//! depth and risk into a single trade recommendation per symbol.

pub mod pipeline;
pub mod snapshot;
pub mod voting;

pub use pipeline::{
    generate_trade_signal, CompleteAnalysis, Direction, MultiPairAnalysis, SignalAggregator,
    TradeSignal,
};
pub use snapshot::{RsiSummary, TechnicalSnapshot, VolumeSummary};
pub use voting::{vote, TimeframeAction, TimeframeSignal};
