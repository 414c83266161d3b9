//! Shared data model and service boundaries for the market analysis core
//!
//! Every pipeline stage consumes and produces the value objects defined
//! here; the only mutable state anywhere is the candle cache owned by the
//! market analyzer.

pub mod computed;
pub mod constants;
pub mod errors;
pub mod provider;
pub mod types;

pub use computed::Computed;
pub use constants::*;
pub use errors::AnalysisError;
pub use provider::{MarketDataProvider, Ticker24h};
pub use types::*;
