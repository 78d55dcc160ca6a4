// src/processors/filters/convolution.rs

use log::trace;
use ndarray::{s, Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis};
use rayon::prelude::*;
use rustfft::{num_complex::Complex, num_traits::Zero, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{FilterError, Result};

/// How the depthwise correlation is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvolutionMethod {
    /// Direct for short kernels, FFT for long ones
    #[default]
    Auto,
    Direct,
    Fft,
}

impl ConvolutionMethod {
    /// Collapse `Auto` into a concrete method for a kernel of `filter_length` taps
    pub fn resolve(self, filter_length: usize) -> ConvolutionMethod {
        match self {
            ConvolutionMethod::Auto if should_use_fft_convolution(filter_length) => {
                ConvolutionMethod::Fft
            }
            ConvolutionMethod::Auto => ConvolutionMethod::Direct,
            other => other,
        }
    }
}

/// Determine whether to use FFT convolution based on filter length
fn should_use_fft_convolution(filter_length: usize) -> bool {
    // FFT wins somewhere between 32 and 64 taps; 48 is a conservative middle
    filter_length > 48
}

/// Number of outputs of a strided valid correlation
pub fn output_length(input_len: usize, kernel_len: usize, stride: usize) -> Option<usize> {
    if stride == 0 || kernel_len == 0 || input_len < kernel_len {
        return None;
    }
    Some((input_len - kernel_len) / stride + 1)
}

/// Frequency-domain correlator for lanes of one fixed length
struct FftCorrelator {
    n_fft: usize,
    kernel_len: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    kernel_spectrum: Vec<Complex<f32>>,
}

impl FftCorrelator {
    fn new(kernel: ArrayView1<'_, f32>, lane_len: usize) -> Self {
        let kernel_len = kernel.len();

        // Linear (not circular) convolution needs room for the full output
        let n_fft = (lane_len + kernel_len - 1).next_power_of_two();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);
        let ifft = planner.plan_fft_inverse(n_fft);

        // Correlation is convolution with the time-reversed kernel
        let mut kernel_spectrum = vec![Complex::zero(); n_fft];
        for (slot, &tap) in kernel_spectrum.iter_mut().zip(kernel.iter().rev()) {
            *slot = Complex::new(tap, 0.0);
        }
        fft.process(&mut kernel_spectrum);

        FftCorrelator {
            n_fft,
            kernel_len,
            fft,
            ifft,
            kernel_spectrum,
        }
    }

    fn correlate_lane(
        &self,
        mut out: ArrayViewMut1<'_, f32>,
        lane: ArrayView1<'_, f32>,
        stride: usize,
    ) {
        let mut buffer = vec![Complex::zero(); self.n_fft];
        for (slot, &x) in buffer.iter_mut().zip(lane.iter()) {
            *slot = Complex::new(x, 0.0);
        }

        self.fft.process(&mut buffer);
        for (bin, &h) in buffer.iter_mut().zip(self.kernel_spectrum.iter()) {
            *bin = *bin * h;
        }
        self.ifft.process(&mut buffer);

        // rustfft doesn't normalize
        let scale = 1.0 / self.n_fft as f32;
        let delay = self.kernel_len - 1;
        for (t, value) in out.iter_mut().enumerate() {
            *value = buffer[t * stride + delay].re * scale;
        }
    }
}

enum Correlator<'k> {
    Direct(ArrayView1<'k, f32>),
    Fft(FftCorrelator),
}

impl Correlator<'_> {
    fn correlate_lane(
        &self,
        mut out: ArrayViewMut1<'_, f32>,
        lane: ArrayView1<'_, f32>,
        stride: usize,
    ) {
        match self {
            Correlator::Direct(kernel) => {
                let k = kernel.len();
                for (t, value) in out.iter_mut().enumerate() {
                    let start = t * stride;
                    *value = lane
                        .slice(s![start..start + k])
                        .iter()
                        .zip(kernel.iter())
                        .fold(0.0f32, |acc, (&x, &w)| acc + x * w);
                }
            }
            Correlator::Fft(fft) => fft.correlate_lane(out, lane, stride),
        }
    }
}

/// Apply one kernel to every (batch, channel) lane of a signal
///
/// This is a grouped 1-D correlation with groups == channels: no channel
/// mixing, no kernel flip, and only the fully overlapping ("valid") outputs.
///
/// Args:
///     signal: Input of shape (batch, channel, time), already padded
///     kernel: Filter taps shared by all channels
///     stride: Step between consecutive outputs
///     method: Direct or FFT evaluation
///     parallel: Spread lanes over the rayon pool
///
/// Returns:
///     Array of shape (batch, channel, (time - taps) / stride + 1)
pub fn depthwise_correlate(
    signal: ArrayView3<'_, f32>,
    kernel: ArrayView1<'_, f32>,
    stride: usize,
    method: ConvolutionMethod,
    parallel: bool,
) -> Result<Array3<f32>> {
    let (n_batch, n_channels, n_samples) = signal.dim();
    let kernel_len = kernel.len();

    if stride == 0 {
        return Err(FilterError::config("stride", "stride must be at least 1"));
    }
    if kernel_len == 0 {
        return Err(FilterError::config("kernel_size", "kernel must have at least one tap"));
    }
    let n_out = output_length(n_samples, kernel_len, stride).ok_or_else(|| {
        FilterError::shape(format!(
            "time length {n_samples} is shorter than the kernel ({kernel_len} taps)"
        ))
    })?;

    let method = method.resolve(kernel_len);
    trace!(
        "depthwise correlation: {n_batch}x{n_channels} lanes, {n_samples} -> {n_out} samples, \
         {kernel_len} taps, stride {stride}, {method:?}, parallel={parallel}"
    );

    let correlator = match method {
        ConvolutionMethod::Fft => Correlator::Fft(FftCorrelator::new(kernel, n_samples)),
        _ => Correlator::Direct(kernel),
    };

    let mut output = Array3::<f32>::zeros((n_batch, n_channels, n_out));
    // One (output, input) pair per batch x channel lane
    let rows: Vec<(ArrayViewMut1<f32>, ArrayView1<f32>)> = output
        .lanes_mut(Axis(2))
        .into_iter()
        .zip(signal.lanes(Axis(2)))
        .collect();

    if parallel {
        rows.into_par_iter()
            .for_each(|(out, lane)| correlator.correlate_lane(out, lane, stride));
    } else {
        rows.into_iter()
            .for_each(|(out, lane)| correlator.correlate_lane(out, lane, stride));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, Array1};

    fn ramp(n_batch: usize, n_channels: usize, n_samples: usize) -> Array3<f32> {
        Array3::from_shape_fn((n_batch, n_channels, n_samples), |(b, c, t)| {
            ((b * 7 + c * 3 + t) as f32 * 0.37).sin()
        })
    }

    #[test]
    fn output_length_formula() {
        assert_eq!(output_length(31, 12, 1), Some(20));
        assert_eq!(output_length(31, 12, 2), Some(10));
        assert_eq!(output_length(12, 12, 3), Some(1));
        assert_eq!(output_length(11, 12, 1), None);
        assert_eq!(output_length(20, 4, 0), None);
    }

    #[test]
    fn auto_resolves_by_length() {
        assert_eq!(ConvolutionMethod::Auto.resolve(12), ConvolutionMethod::Direct);
        assert_eq!(ConvolutionMethod::Auto.resolve(48), ConvolutionMethod::Direct);
        assert_eq!(ConvolutionMethod::Auto.resolve(49), ConvolutionMethod::Fft);
        assert_eq!(ConvolutionMethod::Direct.resolve(256), ConvolutionMethod::Direct);
        assert_eq!(ConvolutionMethod::Fft.resolve(2), ConvolutionMethod::Fft);
    }

    #[test]
    fn direct_correlation_does_not_flip_kernel() {
        let signal = Array3::from_shape_vec((1, 1, 5), vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let kernel = arr1(&[1.0f32, 0.0, -1.0]);
        let out =
            depthwise_correlate(signal.view(), kernel.view(), 1, ConvolutionMethod::Direct, false)
                .unwrap();
        assert_eq!(out.dim(), (1, 1, 3));
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![-2.0, -2.0, -2.0]);
    }

    #[test]
    fn stride_skips_outputs() {
        let signal = Array3::from_shape_fn((1, 1, 10), |(_, _, t)| t as f32);
        let kernel = arr1(&[1.0f32, 1.0]);
        let out =
            depthwise_correlate(signal.view(), kernel.view(), 3, ConvolutionMethod::Direct, false)
                .unwrap();
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![1.0, 7.0, 13.0]);
    }

    #[test]
    fn channels_do_not_mix() {
        let mut signal = Array3::<f32>::zeros((1, 3, 8));
        signal.slice_mut(ndarray::s![0, 1, ..]).fill(1.0);
        let kernel = arr1(&[0.25f32, 0.25, 0.25, 0.25]);
        let out =
            depthwise_correlate(signal.view(), kernel.view(), 1, ConvolutionMethod::Direct, false)
                .unwrap();
        assert!(out.slice(ndarray::s![0, 0, ..]).iter().all(|&v| v == 0.0));
        assert!(out.slice(ndarray::s![0, 1, ..]).iter().all(|&v| v == 1.0));
        assert!(out.slice(ndarray::s![0, 2, ..]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn fft_matches_direct() {
        let signal = ramp(2, 3, 200);
        let kernel: Array1<f32> = Array1::from_shape_fn(61, |i| ((i as f32) * 0.11).cos() / 61.0);
        for &stride in &[1usize, 2, 5] {
            let direct = depthwise_correlate(
                signal.view(),
                kernel.view(),
                stride,
                ConvolutionMethod::Direct,
                false,
            )
            .unwrap();
            let fft = depthwise_correlate(
                signal.view(),
                kernel.view(),
                stride,
                ConvolutionMethod::Fft,
                false,
            )
            .unwrap();
            assert_eq!(direct.dim(), fft.dim());
            for (a, b) in direct.iter().zip(fft.iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn parallel_is_bit_identical_to_sequential() {
        let signal = ramp(3, 4, 64);
        let kernel = arr1(&[0.1f32, 0.2, 0.4, 0.2, 0.1]);
        for method in [ConvolutionMethod::Direct, ConvolutionMethod::Fft] {
            let seq = depthwise_correlate(signal.view(), kernel.view(), 1, method, false).unwrap();
            let par = depthwise_correlate(signal.view(), kernel.view(), 1, method, true).unwrap();
            let seq_bits: Vec<u32> = seq.iter().map(|v| v.to_bits()).collect();
            let par_bits: Vec<u32> = par.iter().map(|v| v.to_bits()).collect();
            assert_eq!(seq_bits, par_bits);
        }
    }

    #[test]
    fn short_signal_is_a_shape_error() {
        let signal = Array3::<f32>::zeros((1, 1, 3));
        let kernel = arr1(&[1.0f32; 4]);
        let err =
            depthwise_correlate(signal.view(), kernel.view(), 1, ConvolutionMethod::Auto, false)
                .unwrap_err();
        assert!(matches!(err, FilterError::Shape { .. }));
    }

    #[test]
    fn zero_stride_is_a_config_error() {
        let signal = Array3::<f32>::zeros((1, 1, 8));
        let kernel = arr1(&[1.0f32; 2]);
        let err =
            depthwise_correlate(signal.view(), kernel.view(), 0, ConvolutionMethod::Auto, false)
                .unwrap_err();
        assert!(matches!(err, FilterError::InvalidConfig { param: "stride", .. }));
    }
}
