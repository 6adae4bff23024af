//! Peak-interval BPM estimator.
//!
//! Intervals are measured on the elapsed-time axis of the snapshot, not on
//! sample indices, so an uneven frame cadence does not skew the result.

use fingerpulse_model::Bpm;

use super::{cosine_peak, EstimatorConfig};
use crate::filters::FilteredSignal;
use crate::stats;

pub fn estimate(signal: &FilteredSignal, config: &EstimatorConfig) -> Option<Bpm> {
    // Rounding up would space peaks wider than the fastest plausible beat
    // at low frame rates.
    let min_distance = ((config.peak_distance_factor * signal.sample_rate).floor() as usize).max(1);
    let peaks = detect_peaks(&signal.values, min_distance);
    if peaks.len() < config.min_peaks.max(2) {
        return None;
    }

    // Peak times carry up to half a frame of error each.
    let slack = 0.5 / signal.sample_rate;
    let bounds = (config.min_interval_secs - slack)..=(config.max_interval_secs + slack);

    let peak_times: Vec<f64> = peaks.iter().map(|&i| refined_time(signal, i)).collect();
    let intervals: Vec<f64> = peak_times
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|dt| bounds.contains(dt))
        .collect();

    let kept = if intervals.len() >= 4 {
        stats::iqr_filter(&intervals, config.iqr_k)
    } else {
        intervals
    };

    let interval = stats::median(&kept)?;
    if interval <= 0.0 {
        return None;
    }
    config.plausible(60.0 / interval)
}

/// Indices of positive local maxima at least `min_distance` samples apart,
/// in ascending order. Taller peaks win when two are too close.
pub fn detect_peaks(values: &[f64], min_distance: usize) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (1..values.len() - 1)
        .filter(|&i| values[i] > 0.0 && values[i] > values[i - 1] && values[i] >= values[i + 1])
        .collect();
    candidates.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut accepted: Vec<usize> = Vec::new();
    for index in candidates {
        if accepted.iter().all(|&p| p.abs_diff(index) >= min_distance) {
            accepted.push(index);
        }
    }
    accepted.sort_unstable();
    accepted
}

/// Peak time with the sub-sample offset of the fitted crest applied.
fn refined_time(signal: &FilteredSignal, index: usize) -> f64 {
    let values = &signal.values;
    let times = &signal.times;
    let (offset, _) = cosine_peak(values[index - 1], values[index], values[index + 1]);
    let half_step = (times[index + 1] - times[index - 1]) / 2.0;
    times[index] + offset * half_step
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn pulse(bpm: f64, times: Vec<f64>) -> FilteredSignal {
        let n = times.len();
        let span = times[n - 1] - times[0];
        FilteredSignal {
            values: times
                .iter()
                .map(|t| (2.0 * PI * bpm / 60.0 * t).sin())
                .collect(),
            sample_rate: (n - 1) as f64 / span,
            times,
        }
    }

    #[test]
    fn test_detect_peaks_respects_distance() {
        let values = [0.0, 1.0, 0.0, 0.8, 0.0, 0.0, 2.0, 0.0];
        assert_eq!(detect_peaks(&values, 3), vec![1, 6]);
        assert_eq!(detect_peaks(&values, 1), vec![1, 3, 6]);
    }

    #[test]
    fn test_negative_maxima_are_ignored() {
        let values = [-3.0, -1.0, -3.0, -2.0, -3.0];
        assert!(detect_peaks(&values, 1).is_empty());
    }

    #[test]
    fn test_recovers_rate_from_even_timestamps() {
        let config = EstimatorConfig::default();
        let times: Vec<f64> = (0..390).map(|i| i as f64 / 30.0).collect();
        let estimate = estimate(&pulse(84.0, times), &config).unwrap();
        assert!((estimate - 84).abs() <= 1);
    }

    #[test]
    fn test_fast_pulse_at_low_frame_rate() {
        // 4.6 samples per beat; a 5-sample minimum distance would skip beats.
        let config = EstimatorConfig::default();
        let times: Vec<f64> = (0..195).map(|i| i as f64 / 15.0).collect();
        let signal = pulse(195.0, times);

        let peaks = detect_peaks(&signal.values, 4);
        assert!((40..=43).contains(&peaks.len()), "{} peaks", peaks.len());

        let estimate = estimate(&signal, &config).unwrap();
        assert!((estimate - 195).abs() <= 2, "{estimate}");
    }

    #[test]
    fn test_uses_timestamps_for_uneven_cadence() {
        // Alternating 25 ms / 41 ms frame gaps, mean 30 fps.
        let config = EstimatorConfig::default();
        let mut t = 0.0;
        let times: Vec<f64> = (0..390)
            .map(|i| {
                let now = t;
                t += if i % 2 == 0 { 0.025 } else { 0.041_666 };
                now
            })
            .collect();
        let estimate = estimate(&pulse(66.0, times), &config).unwrap();
        assert!((estimate - 66).abs() <= 2);
    }

    #[test]
    fn test_too_few_peaks() {
        let config = EstimatorConfig::default();
        let times: Vec<f64> = (0..40).map(|i| i as f64 / 30.0).collect();
        assert!(estimate(&pulse(72.0, times), &config).is_none());
    }
}
