// src/processors/filters/lowpass.rs

use log::debug;
use ndarray::{Array1, Array3, ArrayView3, ArrayViewD, Axis, Ix3};
use serde::{Deserialize, Serialize};

use super::convolution::{depthwise_correlate, output_length, ConvolutionMethod};
use super::kaiser_sinc::kaiser_sinc_filter1d;
use super::padding::{pad_time_axis, PaddingMode};
use crate::error::{FilterError, Result};

/// Construction parameters for [`LowPassFilter1d`]
///
/// Defaults match the anti-aliasing setup used around activations:
/// cutoff 0.5, half-width 0.6, stride 1, replicate padding, 12 taps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowPassConfig {
    /// Normalized cutoff frequency, 0 to 0.5
    pub cutoff: f64,
    /// Half-width of the transition band
    pub half_width: f64,
    pub stride: usize,
    /// Extend the time axis so the output stays aligned with the input
    pub padding: bool,
    pub padding_mode: PaddingMode,
    pub kernel_size: usize,
    pub method: ConvolutionMethod,
}

impl Default for LowPassConfig {
    fn default() -> Self {
        LowPassConfig {
            cutoff: 0.5,
            half_width: 0.6,
            stride: 1,
            padding: true,
            padding_mode: PaddingMode::Replicate,
            kernel_size: 12,
            method: ConvolutionMethod::Auto,
        }
    }
}

impl LowPassConfig {
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_half_width(mut self, half_width: f64) -> Self {
        self.half_width = half_width;
        self
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_padding(mut self, padding: bool) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_padding_mode(mut self, padding_mode: PaddingMode) -> Self {
        self.padding_mode = padding_mode;
        self
    }

    pub fn with_kernel_size(mut self, kernel_size: usize) -> Self {
        self.kernel_size = kernel_size;
        self
    }

    pub fn with_method(mut self, method: ConvolutionMethod) -> Self {
        self.method = method;
        self
    }

    /// Reject parameters the filter cannot be built from
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=0.5).contains(&self.cutoff) {
            let reason = if self.cutoff > 0.5 {
                "a cutoff above 0.5 does not make sense".to_string()
            } else if self.cutoff < 0.0 {
                "minimum cutoff must be larger than zero".to_string()
            } else {
                format!("cutoff out of range [0, 0.5]: {}", self.cutoff)
            };
            return Err(FilterError::config("cutoff", reason));
        }
        if self.kernel_size == 0 {
            return Err(FilterError::config("kernel_size", "kernel size must be at least 1"));
        }
        if self.stride == 0 {
            return Err(FilterError::config("stride", "stride must be at least 1"));
        }
        Ok(())
    }
}

/// View a dynamic-rank array as a (batch, channel, time) signal
pub fn signal_view(signal: ArrayViewD<'_, f32>) -> Result<ArrayView3<'_, f32>> {
    let ndim = signal.ndim();
    signal.into_dimensionality::<Ix3>().map_err(|_| {
        FilterError::shape(format!(
            "expected a (batch, channel, time) signal with 3 axes, got {ndim}"
        ))
    })
}

/// Kaiser-windowed sinc low-pass filter applied depthwise over (batch, channel, time)
///
/// The kernel is designed once in the constructor and never changes, so a
/// filter can be shared across threads and `forward` always returns the
/// same output for the same input.
#[derive(Debug, Clone)]
pub struct LowPassFilter1d {
    config: LowPassConfig,
    even: bool,
    pad_left: usize,
    pad_right: usize,
    kernel: Array1<f32>,
}

impl LowPassFilter1d {
    pub fn new(config: LowPassConfig) -> Result<Self> {
        config.validate()?;

        let kernel_size = config.kernel_size;
        let even = kernel_size % 2 == 0;
        // Even kernels are centered half a sample late; the extra right pad undoes it
        let pad_left = kernel_size / 2 - usize::from(even);
        let pad_right = kernel_size / 2;

        let kernel = kaiser_sinc_filter1d(config.cutoff, config.half_width, kernel_size)
            .mapv(|v| v as f32);
        if kernel.iter().any(|v| !v.is_finite()) {
            return Err(FilterError::config(
                "half_width",
                format!("kernel design is not finite for half_width {}", config.half_width),
            ));
        }

        debug!(
            "low-pass filter ready: {kernel_size} taps, pad ({pad_left}, {pad_right}), \
             stride {}, padding={} ({}), method {:?}",
            config.stride, config.padding, config.padding_mode, config.method
        );

        Ok(LowPassFilter1d {
            config,
            even,
            pad_left,
            pad_right,
            kernel,
        })
    }

    pub fn config(&self) -> &LowPassConfig {
        &self.config
    }

    pub fn kernel(&self) -> &Array1<f32> {
        &self.kernel
    }

    /// The kernel as a (1, 1, kernel_size) tap tensor
    pub fn filter_taps(&self) -> Array3<f32> {
        Array3::from_shape_fn((1, 1, self.kernel.len()), |(_, _, i)| self.kernel[i])
    }

    pub fn kernel_size(&self) -> usize {
        self.config.kernel_size
    }

    pub fn is_even(&self) -> bool {
        self.even
    }

    pub fn pad_left(&self) -> usize {
        self.pad_left
    }

    pub fn pad_right(&self) -> usize {
        self.pad_right
    }

    pub fn stride(&self) -> usize {
        self.config.stride
    }

    /// Output time length for an input of `n_samples`, or `None` if too short
    pub fn output_len(&self, n_samples: usize) -> Option<usize> {
        let padded = if self.config.padding {
            n_samples + self.pad_left + self.pad_right
        } else {
            n_samples
        };
        output_length(padded, self.config.kernel_size, self.config.stride)
    }

    /// Filter a (batch, channel, time) signal
    pub fn forward(&self, signal: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        self.run(signal, false)
    }

    /// Same as [`forward`](Self::forward) with lanes spread over the rayon pool
    pub fn forward_parallel(&self, signal: ArrayView3<'_, f32>) -> Result<Array3<f32>> {
        self.run(signal, true)
    }

    /// Filter a signal of unchecked rank; anything but 3 axes is a shape error
    pub fn forward_dyn(&self, signal: ArrayViewD<'_, f32>) -> Result<Array3<f32>> {
        self.forward(signal_view(signal)?)
    }

    fn run(&self, signal: ArrayView3<'_, f32>, parallel: bool) -> Result<Array3<f32>> {
        let kernel = self.kernel.view();
        let (stride, method) = (self.config.stride, self.config.method);

        if !self.config.padding {
            let n_samples = signal.len_of(Axis(2));
            if n_samples < self.config.kernel_size {
                return Err(FilterError::shape(format!(
                    "time length {n_samples} is shorter than the kernel ({} taps) \
                     and padding is disabled",
                    self.config.kernel_size
                )));
            }
            return depthwise_correlate(signal, kernel, stride, method, parallel);
        }

        let padded = pad_time_axis(
            signal,
            self.pad_left,
            self.pad_right,
            self.config.padding_mode,
        )?;
        depthwise_correlate(padded.view(), kernel, stride, method, parallel)
    }
}
