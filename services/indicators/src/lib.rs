//! Technical indicator library and candlestick pattern scanner
//!
//! Pure computation: no I/O, no shared state. Every function takes a candle
//! series (or a price slice) and returns a value object. Malformed input is
//! reduced to a documented neutral result, never an error. Callers branch
//! on the returned value (and its [`Computed`] provenance), not on absence.
//!
//! [`Computed`]: analyzer_common::Computed

pub mod ema;
pub mod patterns;
pub mod rsi;
pub mod support_resistance;
pub mod volume_profile;

pub use ema::compute_ema;
pub use patterns::{PatternSignals, scan_all};
pub use rsi::{RsiAnalysis, compute_rsi};
pub use support_resistance::{SupportResistance, compute_support_resistance};
pub use volume_profile::{VolumeProfile, compute_volume_profile};
