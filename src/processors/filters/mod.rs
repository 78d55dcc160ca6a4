// src/processors/filters/mod.rs
pub mod convolution;
pub mod kaiser_sinc;
pub mod lowpass;
pub mod padding;
pub mod windows;

// Re-export the filter surface
pub use convolution::{depthwise_correlate, output_length, ConvolutionMethod};
pub use kaiser_sinc::{kaiser_attenuation, kaiser_beta, kaiser_sinc_filter1d, tap_times};
pub use lowpass::{signal_view, LowPassConfig, LowPassFilter1d};
pub use padding::{pad_time_axis, PaddingMode};
pub use windows::{bessel_i0, bessel_i0e, kaiser_window, sinc};
