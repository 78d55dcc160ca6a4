// src/error.rs

use thiserror::Error;

/// Errors raised while configuring or running a low-pass filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A constructor argument is outside its valid domain
    #[error("invalid `{param}`: {reason}")]
    InvalidConfig { param: &'static str, reason: String },

    /// The input signal cannot be filtered with the current settings
    #[error("shape error: {reason}")]
    Shape { reason: String },
}

impl FilterError {
    pub(crate) fn config(param: &'static str, reason: impl Into<String>) -> Self {
        FilterError::InvalidConfig {
            param,
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        FilterError::Shape {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(feature = "python")]
impl From<FilterError> for pyo3::PyErr {
    fn from(err: FilterError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
