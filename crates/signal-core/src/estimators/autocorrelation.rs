//! Autocorrelation BPM estimator.

use fingerpulse_model::Bpm;

use super::{cosine_peak, EstimatorConfig};
use crate::filters::FilteredSignal;

/// Estimate BPM from the autocorrelation peaks whose lags fall between the
/// `max_bpm` and `min_bpm` periods.
///
/// A periodic signal correlates with itself at every multiple of its
/// period, and the strongest peak is sometimes the second or third. A peak
/// near a half or third of the strongest lag that keeps enough of its
/// height is taken as the fundamental.
pub fn estimate(signal: &FilteredSignal, config: &EstimatorConfig) -> Option<Bpm> {
    let fs = signal.sample_rate;
    let min_lag = ((fs / config.max_hz()).floor() as usize).max(1);
    let max_lag = (fs / config.min_hz()).ceil() as usize;
    if max_lag + 1 >= signal.len() {
        return None;
    }

    let acf = normalized_acf(&signal.values, max_lag + 1)?;
    let peaks = refined_peaks(&acf, min_lag, max_lag);
    let &(best_lag, best_height) = peaks.iter().max_by(|a, b| a.1.total_cmp(&b.1))?;

    let min_height = config.subharmonic_ratio * best_height;
    let fundamental = [3.0, 2.0]
        .into_iter()
        .find_map(|divisor| {
            let target = best_lag / divisor;
            peaks
                .iter()
                .find(|&&(lag, height)| (lag - target).abs() <= 1.0 && height >= min_height)
                .map(|&(lag, _)| lag)
        })
        .unwrap_or(best_lag);

    config.plausible(60.0 * fs / fundamental)
}

/// Positive local maxima of `acf` in `min_lag..=max_lag`, as
/// (fractional lag, refined height).
fn refined_peaks(acf: &[f64], min_lag: usize, max_lag: usize) -> Vec<(f64, f64)> {
    (min_lag..=max_lag)
        .filter_map(|lag| {
            let (prev, here, next) = (acf[lag - 1], acf[lag], acf[lag + 1]);
            if here > prev && here >= next && here > 0.0 {
                let (offset, height) = cosine_peak(prev, here, next);
                Some((lag as f64 + offset, height))
            } else {
                None
            }
        })
        .collect()
}

/// Biased autocorrelation for lags `0..=max_lag`, normalized by lag 0.
pub fn normalized_acf(values: &[f64], max_lag: usize) -> Option<Vec<f64>> {
    let n = values.len();
    if n == 0 || max_lag >= n {
        return None;
    }
    let energy: f64 = values.iter().map(|v| v * v).sum();
    if energy <= f64::EPSILON {
        return None;
    }
    Some(
        (0..=max_lag)
            .map(|lag| {
                values
                    .iter()
                    .zip(&values[lag..])
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
                    / energy
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(bpm: f64, fs: f64, n: usize) -> FilteredSignal {
        let freq = bpm / 60.0;
        let times: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        FilteredSignal {
            values: times.iter().map(|t| (2.0 * PI * freq * t).sin()).collect(),
            times,
            sample_rate: fs,
        }
    }

    #[test]
    fn test_recovers_sinusoid_rate() {
        let config = EstimatorConfig::default();
        for bpm in [48.0, 72.0, 96.0, 150.0] {
            let estimate = estimate(&sine(bpm, 30.0, 390), &config).unwrap();
            assert!((estimate as f64 - bpm).abs() <= 1.0, "{bpm} -> {estimate}");
        }
    }

    #[test]
    fn test_prefers_fundamental_over_double_period() {
        // Under six samples per beat the raw ACF maximum sits at two or
        // three beats of lag.
        let config = EstimatorConfig::default();
        for bpm in [160.0, 168.0, 193.0, 197.0] {
            let estimate = estimate(&sine(bpm, 15.0, 195), &config).unwrap();
            assert!((estimate as f64 - bpm).abs() <= 2.0, "{bpm} -> {estimate}");
        }
    }

    #[test]
    fn test_acf_lag_zero_is_one() {
        let acf = normalized_acf(&[1.0, -1.0, 1.0, -1.0], 2).unwrap();
        assert!((acf[0] - 1.0).abs() < 1e-12);
        assert!(acf[1] < 0.0);
        assert!(normalized_acf(&[0.0; 8], 2).is_none());
    }

    #[test]
    fn test_too_short_for_slowest_lag() {
        let config = EstimatorConfig::default();
        assert!(estimate(&sine(72.0, 30.0, 40), &config).is_none());
    }
}
