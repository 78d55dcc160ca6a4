// src/processors/filters/kaiser_sinc.rs

use log::debug;
use ndarray::Array1;
use std::f64::consts::PI;

use super::windows::{kaiser_window, sinc};

/// Empirical attenuation estimate (dB) for a kernel of `half_size` taps per side
pub fn kaiser_attenuation(half_size: usize, half_width: f64) -> f64 {
    let delta_f = 4.0 * half_width;
    2.285 * (half_size as f64 - 1.0) * PI * delta_f + 7.95
}

/// Kaiser shape parameter for a given attenuation
///
/// Three-branch rule: linear above 50 dB, the 0.4-power blend between 21
/// and 50 dB (both bounds inclusive), rectangular window below 21 dB.
pub fn kaiser_beta(attenuation: f64) -> f64 {
    if attenuation > 50.0 {
        0.1102 * (attenuation - 8.7)
    } else if attenuation >= 21.0 {
        0.5842 * (attenuation - 21.0).powf(0.4) + 0.07886 * (attenuation - 21.0)
    } else {
        0.0
    }
}

/// Sample positions of the taps, relative to the filter center
///
/// Even lengths are centered between two samples, odd lengths on a sample.
pub fn tap_times(kernel_size: usize) -> Array1<f64> {
    let half_size = (kernel_size / 2) as f64;
    let offset = if kernel_size % 2 == 0 { 0.5 } else { 0.0 };
    Array1::from_shape_fn(kernel_size, |i| i as f64 - half_size + offset)
}

/// Design a Kaiser-windowed sinc low-pass kernel
///
/// Args:
///     cutoff: Normalized cutoff frequency (0 to 0.5). Not validated here.
///     half_width: Half-width of the transition band
///     kernel_size: Number of taps
///
/// Returns:
///     `kernel_size` coefficients summing to 1, or all zeros when cutoff is 0
pub fn kaiser_sinc_filter1d(cutoff: f64, half_width: f64, kernel_size: usize) -> Array1<f64> {
    let half_size = kernel_size / 2;

    let attenuation = kaiser_attenuation(half_size, half_width);
    let beta = kaiser_beta(attenuation);
    debug!(
        "designing kaiser-sinc kernel: cutoff={cutoff}, half_width={half_width}, \
         kernel_size={kernel_size}, A={attenuation:.3}, beta={beta:.4}"
    );

    // Zero cutoff means no passband at all
    if cutoff == 0.0 {
        return Array1::zeros(kernel_size);
    }

    let window = kaiser_window(kernel_size, beta);
    let time = tap_times(kernel_size);

    let raw: Array1<f64> = window
        .iter()
        .zip(time.iter())
        .map(|(&w, &t)| 2.0 * cutoff * w * sinc(2.0 * cutoff * t))
        .collect();

    // Unit DC gain, otherwise a constant input leaks through attenuated
    let sum = raw.sum();
    raw.mapv(|v| v / sum)
}
