// src/processors/filters/windows.rs

use ndarray::Array1;
use std::f64::consts::PI;

/// Normalized sinc, sin(pi * x) / (pi * x)
///
/// The removable singularity at zero is handled explicitly so the division
/// never sees a zero denominator.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Zeroth-order modified Bessel function of the first kind, I0(x)
///
/// Power series in (x/2)^2; converges quickly for the beta values produced
/// by the Kaiser design formula.
pub fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let x_half = x / 2.0;

    for k in 1..=500 {
        term *= (x_half / k as f64) * (x_half / k as f64);
        sum += term;
        if term < 1e-20 * sum {
            break;
        }
    }

    sum
}

/// Exponentially scaled I0, exp(-|x|) * I0(x)
///
/// Stays finite where I0 itself overflows (|x| above about 709). The power
/// series is used up to `I0E_ASYMPTOTIC_FROM`, the large-argument expansion
/// e^x / sqrt(2 pi x) * sum(((2k - 1)!!)^2 / (k! (8x)^k)) above it.
pub fn bessel_i0e(x: f64) -> f64 {
    let x = x.abs();
    if x < I0E_ASYMPTOTIC_FROM {
        return bessel_i0(x) * (-x).exp();
    }

    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    for k in 1..=60 {
        let odd = (2 * k - 1) as f64;
        let next = term * odd * odd / (k as f64 * 8.0 * x);
        // Asymptotic series: stop before the terms start growing again
        if next >= term {
            break;
        }
        term = next;
        sum += term;
        if term < 1e-17 * sum {
            break;
        }
    }

    sum / (2.0 * PI * x).sqrt()
}

const I0E_ASYMPTOTIC_FROM: f64 = 50.0;

/// Symmetric (non-periodic) Kaiser window of `length` points
///
/// w[n] = I0(beta * sqrt(1 - (2n / (N - 1) - 1)^2)) / I0(beta)
///
/// The ratio is taken as i0e(a) / i0e(beta) * exp(a - beta) so that large
/// beta values from long kernels do not overflow.
pub fn kaiser_window(length: usize, beta: f64) -> Array1<f64> {
    match length {
        0 => Array1::zeros(0),
        1 => Array1::ones(1),
        _ => {
            let m = (length - 1) as f64;
            let beta = beta.abs();
            let denom = bessel_i0e(beta);
            Array1::from_shape_fn(length, |n| {
                let x = 2.0 * n as f64 / m - 1.0;
                let arg = beta * (1.0 - x * x).max(0.0).sqrt();
                bessel_i0e(arg) / denom * (arg - beta).exp()
            })
        }
    }
}
