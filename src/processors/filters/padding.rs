// src/processors/filters/padding.rs

use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FilterError, Result};

/// Boundary extension used before filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingMode {
    /// Repeat the edge sample: a a | a b c d | d d
    #[default]
    Replicate,
    /// Pad with zeros: 0 0 | a b c d | 0 0
    #[serde(alias = "zero", alias = "constant")]
    Zeros,
    /// Mirror without repeating the edge: c b | a b c d | c b
    Reflect,
    /// Wrap around: c d | a b c d | a b
    Circular,
}

impl PaddingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaddingMode::Replicate => "replicate",
            PaddingMode::Zeros => "zeros",
            PaddingMode::Reflect => "reflect",
            PaddingMode::Circular => "circular",
        }
    }

    /// Check that a lane of `len` samples can be extended by the given amounts
    pub fn check_extent(&self, len: usize, pad_left: usize, pad_right: usize) -> Result<()> {
        let widest = pad_left.max(pad_right);
        if widest == 0 {
            return Ok(());
        }
        match self {
            PaddingMode::Zeros => Ok(()),
            PaddingMode::Replicate if len == 0 => Err(FilterError::shape(
                "replicate padding needs at least one sample",
            )),
            PaddingMode::Reflect if widest >= len => Err(FilterError::shape(format!(
                "reflect padding of {widest} needs more than {widest} samples, got {len}"
            ))),
            PaddingMode::Circular if widest > len => Err(FilterError::shape(format!(
                "circular padding of {widest} needs at least {widest} samples, got {len}"
            ))),
            _ => Ok(()),
        }
    }

    /// Index into the unpadded lane for padded position `pos - pad_left`
    ///
    /// `None` means the padded sample is zero.
    fn source_index(&self, offset: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if (0..n).contains(&offset) {
            return Some(offset as usize);
        }
        match self {
            PaddingMode::Zeros => None,
            PaddingMode::Replicate => Some(offset.clamp(0, n - 1) as usize),
            PaddingMode::Reflect => {
                let idx = if offset < 0 { -offset } else { 2 * (n - 1) - offset };
                Some(idx as usize)
            }
            PaddingMode::Circular => Some(offset.rem_euclid(n) as usize),
        }
    }
}

impl fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaddingMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "replicate" => Ok(PaddingMode::Replicate),
            "zeros" | "zero" | "constant" => Ok(PaddingMode::Zeros),
            "reflect" => Ok(PaddingMode::Reflect),
            "circular" => Ok(PaddingMode::Circular),
            other => Err(FilterError::config(
                "padding_mode",
                format!(
                    "unknown padding mode '{other}' \
                     (expected replicate, zeros, reflect or circular)"
                ),
            )),
        }
    }
}

fn pad_lane(
    mut out: ArrayViewMut1<'_, f32>,
    lane: ArrayView1<'_, f32>,
    pad_left: usize,
    mode: PaddingMode,
) {
    let len = lane.len();
    for (pos, value) in out.iter_mut().enumerate() {
        let offset = pos as isize - pad_left as isize;
        *value = match mode.source_index(offset, len) {
            Some(idx) => lane[idx],
            None => 0.0,
        };
    }
}

/// Extend the time axis (last axis) of a (batch, channel, time) signal
pub fn pad_time_axis(
    signal: ArrayView3<'_, f32>,
    pad_left: usize,
    pad_right: usize,
    mode: PaddingMode,
) -> Result<Array3<f32>> {
    let (n_batch, n_channels, n_samples) = signal.dim();
    mode.check_extent(n_samples, pad_left, pad_right)?;

    let mut padded = Array3::<f32>::zeros((n_batch, n_channels, n_samples + pad_left + pad_right));
    Zip::from(padded.lanes_mut(Axis(2)))
        .and(signal.lanes(Axis(2)))
        .for_each(|out, lane| pad_lane(out, lane, pad_left, mode));

    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3};

    fn lane(values: &[f32]) -> Array3<f32> {
        Array3::from_shape_vec((1, 1, values.len()), values.to_vec()).unwrap()
    }

    fn padded(values: &[f32], left: usize, right: usize, mode: PaddingMode) -> Vec<f32> {
        pad_time_axis(lane(values).view(), left, right, mode)
            .unwrap()
            .iter()
            .copied()
            .collect()
    }

    #[test]
    fn replicate_repeats_edges() {
        assert_eq!(
            padded(&[1.0, 2.0, 3.0], 2, 3, PaddingMode::Replicate),
            vec![1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0, 3.0]
        );
    }

    #[test]
    fn zeros_fill_with_zero() {
        assert_eq!(
            padded(&[1.0, 2.0], 1, 2, PaddingMode::Zeros),
            vec![0.0, 1.0, 2.0, 0.0, 0.0]
        );
    }

    #[test]
    fn reflect_skips_edge_sample() {
        assert_eq!(
            padded(&[1.0, 2.0, 3.0, 4.0], 2, 2, PaddingMode::Reflect),
            vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0]
        );
    }

    #[test]
    fn circular_wraps() {
        assert_eq!(
            padded(&[1.0, 2.0, 3.0, 4.0], 2, 1, PaddingMode::Circular),
            vec![3.0, 4.0, 1.0, 2.0, 3.0, 4.0, 1.0]
        );
    }

    #[test]
    fn reflect_rejects_short_lanes() {
        let err = pad_time_axis(lane(&[1.0, 2.0]).view(), 2, 2, PaddingMode::Reflect).unwrap_err();
        assert!(matches!(err, FilterError::Shape { .. }));
    }

    #[test]
    fn circular_rejects_short_lanes() {
        let err = pad_time_axis(lane(&[1.0, 2.0]).view(), 3, 0, PaddingMode::Circular).unwrap_err();
        assert!(matches!(err, FilterError::Shape { .. }));
        assert!(pad_time_axis(lane(&[1.0, 2.0]).view(), 2, 2, PaddingMode::Circular).is_ok());
    }

    #[test]
    fn replicate_rejects_empty_lanes() {
        let err = pad_time_axis(lane(&[]).view(), 1, 1, PaddingMode::Replicate).unwrap_err();
        assert!(matches!(err, FilterError::Shape { .. }));
    }

    #[test]
    fn channels_are_padded_independently() {
        let signal = Array3::from_shape_fn((2, 3, 4), |(b, c, t)| (b * 100 + c * 10 + t) as f32);
        let out = pad_time_axis(signal.view(), 1, 1, PaddingMode::Replicate).unwrap();
        assert_eq!(out.dim(), (2, 3, 6));
        assert_eq!(
            out.slice(ndarray::s![1, 2, ..]),
            arr1(&[120.0, 120.0, 121.0, 122.0, 123.0, 123.0])
        );
    }

    #[test]
    fn parse_mode_names() {
        assert_eq!("replicate".parse::<PaddingMode>().unwrap(), PaddingMode::Replicate);
        assert_eq!("constant".parse::<PaddingMode>().unwrap(), PaddingMode::Zeros);
        assert_eq!("Reflect".parse::<PaddingMode>().unwrap(), PaddingMode::Reflect);
        assert_eq!("circular".parse::<PaddingMode>().unwrap(), PaddingMode::Circular);
        assert!(matches!(
            "edge".parse::<PaddingMode>(),
            Err(FilterError::InvalidConfig { param: "padding_mode", .. })
        ));
        assert_eq!(PaddingMode::Zeros.to_string(), "zeros");
    }
}
