//! Spectral (FFT) BPM estimator.

use std::f64::consts::PI;

use fingerpulse_model::Bpm;
use rustfft::{num_complex::Complex, FftPlanner};

use super::{parabolic_offset, EstimatorConfig};
use crate::filters::FilteredSignal;

/// Estimate BPM from the dominant in-band frequency of the power spectrum.
///
/// The signal is Hann-windowed and zero-padded to at least `fft_min_len`
/// (next power of two), and the peak bin is refined by parabolic
/// interpolation on the magnitude.
pub fn estimate(signal: &FilteredSignal, config: &EstimatorConfig) -> Option<Bpm> {
    let n = signal.len();
    let fs = signal.sample_rate;
    if n < 4 || fs <= 0.0 {
        return None;
    }

    let fft_len = n.next_power_of_two().max(config.fft_min_len.next_power_of_two());
    let magnitude = magnitude_spectrum(&signal.values, fft_len);

    let bin_hz = fs / fft_len as f64;
    let lo = ((config.min_hz() / bin_hz).floor() as usize).max(1);
    let hi = ((config.max_hz() / bin_hz).ceil() as usize).min(magnitude.len() - 2);
    if lo > hi {
        return None;
    }

    let (peak_bin, peak) = (lo..=hi)
        .map(|bin| (bin, magnitude[bin]))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    // A maximum on the search edge is leakage from outside the band.
    if peak <= f64::EPSILON
        || magnitude[peak_bin - 1] > peak
        || magnitude[peak_bin + 1] > peak
    {
        return None;
    }

    let offset = parabolic_offset(
        magnitude[peak_bin - 1],
        magnitude[peak_bin],
        magnitude[peak_bin + 1],
    );
    config.plausible((peak_bin as f64 + offset) * bin_hz * 60.0)
}

/// One-sided magnitude spectrum (`fft_len / 2 + 1` bins) of the
/// Hann-windowed, zero-padded input.
fn magnitude_spectrum(values: &[f64], fft_len: usize) -> Vec<f64> {
    let n = values.len();
    let mut buffer: Vec<Complex<f64>> = values
        .iter()
        .enumerate()
        .map(|(i, v)| Complex::new(v * hann(i, n), 0.0))
        .collect();
    buffer.resize(fft_len, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_len);
    fft.process(&mut buffer);

    buffer.iter().take(fft_len / 2 + 1).map(|c| c.norm()).collect()
}

fn hann(i: usize, n: usize) -> f64 {
    if n < 2 {
        return 1.0;
    }
    0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos()
}
