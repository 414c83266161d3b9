//! Candle cache with pluggable persistence
//!
//! The cache is an explicit collaborator injected into the analyzer, keyed
//! by (symbol, timeframe). A cached series is served while younger than the
//! TTL; otherwise the provider is asked for a fresh copy and the store is
//! refreshed. Writes are last-fetch-wins: concurrent refreshes of the same
//! key are harmless.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use analyzer_common::constants::{CANDLE_CACHE_TTL_SECS, CANDLE_FETCH_LIMIT};
use analyzer_common::{CandleSeries, MarketDataProvider, Timeframe};

/// A cached series together with the instant it was fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSeries {
    pub series: CandleSeries,
    pub last_updated: DateTime<Utc>,
}

impl CachedSeries {
    pub fn new(series: CandleSeries) -> Self {
        Self { series, last_updated: Utc::now() }
    }

    /// Age relative to `now`, saturating at zero for clock skew.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_updated).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Persistence backend for cached candle series.
///
/// Implementations are infallible at this boundary: a backend that cannot
/// load or persist an entry logs and behaves as a miss.
pub trait CandleStore: Send + Sync {
    fn load(&self, symbol: &str, timeframe: Timeframe) -> Option<CachedSeries>;
    fn save(&self, entry: CachedSeries);
}

/// In-memory store, the default for tests and short-lived runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<(String, Timeframe), CachedSeries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CandleStore for MemoryStore {
    fn load(&self, symbol: &str, timeframe: Timeframe) -> Option<CachedSeries> {
        self.entries
            .get(&(symbol.to_string(), timeframe))
            .map(|entry| entry.clone())
    }

    fn save(&self, entry: CachedSeries) {
        let key = (entry.series.symbol.clone(), entry.series.timeframe);
        self.entries.insert(key, entry);
    }
}

/// File-backed store writing one JSON document per (symbol, timeframe)
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store under `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn entry_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.root.join(format!("{symbol}_{}.json", timeframe.label()))
    }
}

impl CandleStore for JsonFileStore {
    fn load(&self, symbol: &str, timeframe: Timeframe) -> Option<CachedSeries> {
        let path = self.entry_path(symbol, timeframe);
        if !path.exists() {
            return None;
        }
        match read_entry(&path) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(symbol, timeframe = %timeframe, error = %e, "discarding unreadable cache file");
                None
            }
        }
    }

    fn save(&self, entry: CachedSeries) {
        let path = self.entry_path(&entry.series.symbol, entry.series.timeframe);
        if let Err(e) = write_entry(&path, &entry) {
            warn!(
                symbol = %entry.series.symbol,
                timeframe = %entry.series.timeframe,
                error = %e,
                "failed to persist cache entry"
            );
        }
    }
}

fn read_entry(path: &Path) -> anyhow::Result<CachedSeries> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_entry(path: &Path, entry: &CachedSeries) -> anyhow::Result<()> {
    let raw = serde_json::to_string(entry)?;
    std::fs::write(path, raw)?;
    Ok(())
}

/// TTL cache over a [`CandleStore`]
pub struct CandleCache<S> {
    store: S,
    ttl: Duration,
}

impl<S: CandleStore> CandleCache<S> {
    /// Cache with the default 1-hour TTL.
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, Duration::from_secs(CANDLE_CACHE_TTL_SECS as u64))
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Candle series for every requested timeframe, cache-first.
    ///
    /// A timeframe whose fetch fails (or returns an empty series) is simply
    /// absent from the result; callers treat a fully empty map as fatal.
    pub async fn get_candles(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &str,
        timeframes: &[Timeframe],
    ) -> FxHashMap<Timeframe, CandleSeries> {
        let mut out = FxHashMap::default();
        let now = Utc::now();
        for &timeframe in timeframes {
            if let Some(cached) = self.store.load(symbol, timeframe) {
                if cached.age(now) < self.ttl && !cached.series.is_empty() {
                    out.insert(timeframe, cached.series);
                    continue;
                }
            }
            match provider.fetch_candles(symbol, timeframe, CANDLE_FETCH_LIMIT).await {
                Ok(series) if !series.is_empty() => {
                    self.store.save(CachedSeries::new(series.clone()));
                    out.insert(timeframe, series);
                }
                Ok(_) => {
                    warn!(symbol, timeframe = %timeframe, "provider returned no candles");
                }
                Err(e) => {
                    warn!(symbol, timeframe = %timeframe, error = %e, "candle fetch failed");
                }
            }
        }
        out
    }
}
