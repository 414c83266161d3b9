//! Price-binned volume distribution

use analyzer_common::{CandleSeries, Computed, VALUE_AREA_FRACTION, VOLUME_PROFILE_BINS};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Volume histogram over evenly spaced price levels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// Bin price levels, ascending
    pub price_levels: Vec<f64>,
    /// Accumulated volume per bin
    pub volumes: Vec<f64>,
    /// Price of the bin holding the most volume
    pub poc: f64,
    /// Lower bound of the 70% value area
    pub value_area_low: f64,
    /// Upper bound of the 70% value area
    pub value_area_high: f64,
    /// Total distributed volume
    pub total_volume: f64,
}

impl VolumeProfile {
    /// Neutral shape for unusable input: empty histogram, aggregate prices
    /// taken from whatever bars exist.
    fn neutral(series: &CandleSeries) -> Self {
        if series.is_empty() {
            return Self::default();
        }
        let closes = series.closes();
        let mean_close = closes.iter().sum::<f64>() / closes.len() as f64;
        Self {
            price_levels: Vec::new(),
            volumes: Vec::new(),
            poc: mean_close,
            value_area_low: series.candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
            value_area_high: series
                .candles
                .iter()
                .map(|c| c.high)
                .fold(f64::NEG_INFINITY, f64::max),
            total_volume: series.volumes().iter().sum(),
        }
    }
}

/// Volume profile with the default 100-bin resolution.
pub fn compute_volume_profile(series: &CandleSeries) -> Computed<VolumeProfile> {
    compute_volume_profile_with(series, VOLUME_PROFILE_BINS)
}

/// Volume profile with an explicit bin count.
///
/// Bin levels span [min(low, close), max(high, close)]; a zero-width range
/// is padded by 0.1%. Each candle's volume is split equally across the
/// levels its [low, high] range covers (bins are equal width, so the equal
/// split is the proportional one), normalized so the candle contributes
/// exactly its volume; a collapsed candle range assigns everything to the
/// nearest level. The value area is the price span of the smallest
/// descending-volume bin set reaching 70% of total volume.
pub fn compute_volume_profile_with(series: &CandleSeries, num_bins: usize) -> Computed<VolumeProfile> {
    if series.is_empty() || num_bins < 2 {
        warn!(
            symbol = %series.symbol,
            bins = num_bins,
            "volume profile: unusable input, returning neutral"
        );
        return Computed::Neutral(VolumeProfile::neutral(series));
    }

    let mut price_min = f64::INFINITY;
    let mut price_max = f64::NEG_INFINITY;
    for candle in &series.candles {
        price_min = price_min.min(candle.low).min(candle.close);
        price_max = price_max.max(candle.high).max(candle.close);
    }
    if price_min == price_max {
        price_max = price_min * 1.001;
    }

    let step = (price_max - price_min) / (num_bins - 1) as f64;
    let price_levels: Vec<f64> = (0..num_bins).map(|i| price_min + step * i as f64).collect();
    let mut volumes = vec![0.0; num_bins];

    for candle in &series.candles {
        let (low, high) = (candle.low, candle.high);
        if high <= low {
            // Collapsed range: full volume to the nearest level.
            let idx = (((low - price_min) / step).round() as usize).min(num_bins - 1);
            volumes[idx] += candle.volume;
            continue;
        }
        let first = (((low - price_min) / step).ceil() as usize).min(num_bins - 1);
        let last = (((high - price_min) / step).floor() as usize).min(num_bins - 1);
        if first > last {
            // Range falls between two levels; nearest one takes it all.
            let idx = ((((low + high) / 2.0 - price_min) / step).round() as usize).min(num_bins - 1);
            volumes[idx] += candle.volume;
            continue;
        }
        let share = candle.volume / (last - first + 1) as f64;
        for volume in &mut volumes[first..=last] {
            *volume += share;
        }
    }

    let total_volume: f64 = volumes.iter().sum();
    if total_volume <= 0.0 {
        warn!(symbol = %series.symbol, "volume profile: no volume, returning neutral");
        return Computed::Neutral(VolumeProfile::neutral(series));
    }

    let poc_idx = volumes
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut order: Vec<usize> = (0..num_bins).collect();
    order.sort_by(|&a, &b| {
        volumes[b].partial_cmp(&volumes[a]).unwrap_or(std::cmp::Ordering::Equal)
    });

    let target = total_volume * VALUE_AREA_FRACTION;
    let mut cumulative = 0.0;
    let mut value_area_low = price_levels[poc_idx];
    let mut value_area_high = price_levels[poc_idx];
    for &idx in &order {
        cumulative += volumes[idx];
        value_area_low = value_area_low.min(price_levels[idx]);
        value_area_high = value_area_high.max(price_levels[idx]);
        if cumulative >= target {
            break;
        }
    }

    Computed::Value(VolumeProfile {
        poc: price_levels[poc_idx],
        price_levels,
        volumes,
        value_area_low,
        value_area_high,
        total_volume,
    })
}
