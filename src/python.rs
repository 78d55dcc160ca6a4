// src/python.rs

use numpy::{IntoPyArray, PyArray1, PyArray3, PyReadonlyArrayDyn};
use pyo3::prelude::*;

use crate::processors::filters::{
    kaiser_sinc_filter1d, signal_view, LowPassConfig, LowPassFilter1d,
};

/// Design a Kaiser-windowed sinc low-pass kernel
///
/// Returns:
///     Filter taps of shape [1, 1, kernel_size]
#[pyfunction]
#[pyo3(name = "kaiser_sinc_filter1d")]
pub fn py_kaiser_sinc_filter1d(
    py: Python<'_>,
    cutoff: f64,
    half_width: f64,
    kernel_size: usize,
) -> PyResult<Py<PyArray3<f64>>> {
    let taps = kaiser_sinc_filter1d(cutoff, half_width, kernel_size)
        .into_shape_with_order((1, 1, kernel_size))
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;

    Ok(taps.into_pyarray(py).into())
}

/// 1D low-pass filter using a Kaiser-windowed sinc kernel
#[pyclass(name = "LowPassFilter1d", frozen)]
pub struct PyLowPassFilter1d {
    inner: LowPassFilter1d,
}

#[pymethods]
impl PyLowPassFilter1d {
    #[new]
    #[pyo3(signature = (
        cutoff = 0.5,
        half_width = 0.6,
        stride = 1,
        padding = true,
        padding_mode = "replicate",
        kernel_size = 12
    ))]
    fn new(
        cutoff: f64,
        half_width: f64,
        stride: usize,
        padding: bool,
        padding_mode: &str,
        kernel_size: usize,
    ) -> PyResult<Self> {
        let config = LowPassConfig::default()
            .with_cutoff(cutoff)
            .with_half_width(half_width)
            .with_stride(stride)
            .with_padding(padding)
            .with_padding_mode(padding_mode.parse()?)
            .with_kernel_size(kernel_size);

        Ok(PyLowPassFilter1d {
            inner: LowPassFilter1d::new(config)?,
        })
    }

    /// Apply low-pass filtering to a [B, C, T] array
    #[pyo3(signature = (x, parallel = None))]
    fn forward<'py>(
        &self,
        py: Python<'py>,
        x: PyReadonlyArrayDyn<'py, f32>,
        parallel: Option<bool>,
    ) -> PyResult<Py<PyArray3<f32>>> {
        let use_parallel = parallel.unwrap_or(false);

        // Extract data to owned Rust arrays
        let data = x.as_array().to_owned();

        // Allow Python threads to run during computation
        let output = Python::allow_threads(py, || {
            let signal = signal_view(data.view())?;
            if use_parallel {
                self.inner.forward_parallel(signal)
            } else {
                self.inner.forward(signal)
            }
        })?;

        Ok(output.into_pyarray(py).into())
    }

    fn __call__<'py>(
        &self,
        py: Python<'py>,
        x: PyReadonlyArrayDyn<'py, f32>,
    ) -> PyResult<Py<PyArray3<f32>>> {
        self.forward(py, x, None)
    }

    #[getter]
    fn kernel(&self, py: Python<'_>) -> Py<PyArray1<f32>> {
        self.inner.kernel().clone().into_pyarray(py).into()
    }

    #[getter]
    fn kernel_size(&self) -> usize {
        self.inner.kernel_size()
    }

    #[getter]
    fn even(&self) -> bool {
        self.inner.is_even()
    }

    #[getter]
    fn pad_left(&self) -> usize {
        self.inner.pad_left()
    }

    #[getter]
    fn pad_right(&self) -> usize {
        self.inner.pad_right()
    }

    #[getter]
    fn stride(&self) -> usize {
        self.inner.stride()
    }
}

/// Python module entry point
#[pymodule]
fn _rs(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_kaiser_sinc_filter1d, py)?)?;
    m.add_class::<PyLowPassFilter1d>()?;
    Ok(())
}
