// src/lib.rs

//! Anti-aliasing low-pass FIR filtering for (batch, channel, time) signals.
//!
//! [`kaiser_sinc_filter1d`] designs a Kaiser-windowed sinc kernel with unit
//! DC gain; [`LowPassFilter1d`] holds one such kernel and applies it to
//! every channel independently after padding the time axis.

pub mod error;
pub mod processors;

#[cfg(feature = "python")]
mod python;

pub use error::{FilterError, Result};

// Re-export the filter surface at the crate root
pub use processors::filters::{
    depthwise_correlate,
    kaiser_sinc_filter1d,
    kaiser_window,
    pad_time_axis,
    signal_view,
    sinc,
    ConvolutionMethod,
    LowPassConfig,
    LowPassFilter1d,
    PaddingMode,
};
