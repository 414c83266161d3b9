//! Exponential moving averages

use rustc_hash::FxHashMap;

/// EMA series for each requested period, keyed by period.
///
/// Smoothing factor α = 2/(period+1), seeded with the first price rather
/// than an SMA, so the output has the same length as the input and tracks
/// price closely on short series. Non-finite prices are carried forward
/// from the previous EMA value.
pub fn compute_ema(closes: &[f64], periods: &[usize]) -> FxHashMap<usize, Vec<f64>> {
    let mut out = FxHashMap::default();
    for &period in periods {
        if period == 0 {
            continue;
        }
        out.insert(period, ema_series(closes, period));
    }
    out
}

fn ema_series(closes: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut series = Vec::with_capacity(closes.len());
    let mut prev: Option<f64> = None;
    for &price in closes {
        let next = match prev {
            None => {
                if price.is_finite() {
                    price
                } else {
                    0.0
                }
            }
            Some(last) => {
                if price.is_finite() {
                    price * alpha + last * (1.0 - alpha)
                } else {
                    last
                }
            }
        };
        series.push(next);
        prev = Some(next);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_by_first_value() {
        let closes = [10.0, 11.0, 12.0];
        let emas = compute_ema(&closes, &[9]);
        let series = &emas[&9];
        assert_eq!(series[0], 10.0);
        let alpha = 2.0 / 10.0;
        assert!((series[1] - (11.0 * alpha + 10.0 * (1.0 - alpha))).abs() < 1e-12);
    }

    #[test]
    fn short_series_tracks_price() {
        // No minimum-length requirement: a 2-bar series still yields output.
        let emas = compute_ema(&[100.0, 200.0], &[200]);
        assert_eq!(emas[&200].len(), 2);
        assert!(emas[&200][1] > 100.0);
    }

    #[test]
    fn empty_input_yields_empty_series() {
        let emas = compute_ema(&[], &[9, 20]);
        assert!(emas[&9].is_empty());
        assert!(emas[&20].is_empty());
    }

    #[test]
    fn non_finite_price_carries_previous_value() {
        let emas = compute_ema(&[10.0, f64::NAN, 12.0], &[9]);
        let series = &emas[&9];
        assert_eq!(series[1], 10.0);
        assert!(series[2].is_finite());
    }
}
