//! Error taxonomy for the analysis pipeline
//!
//! Most numeric edge cases never surface as errors at all: indicator
//! functions substitute documented neutral values (see [`crate::Computed`]).
//! The variants here cover the conditions that callers can meaningfully
//! react to.

use thiserror::Error;

/// Analysis pipeline errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed input that cannot be reduced to a neutral default
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A threshold-bound computation received too few bars
    #[error("insufficient data: required {required}, got {got}")]
    InsufficientData {
        /// Bars required by the computation
        required: usize,
        /// Bars actually available
        got: usize,
    },

    /// No timeframe produced any candle data; the only fatal pipeline
    /// condition for a single analysis request
    #[error("no market data available for {0} on any timeframe")]
    NoMarketData(String),

    /// The external data provider failed
    #[error("provider error: {0}")]
    Provider(String),
}
