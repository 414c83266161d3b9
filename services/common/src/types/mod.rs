//! Canonical market data types shared by every analysis service

pub mod market;

pub use market::*;
