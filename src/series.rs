//! Time series input type.

use crate::error::{Error, Result};
use crate::stats::{compute_mean, compute_var};

/// Minimum number of observations: anything shorter leaves no room for a
/// change point away from both edges.
pub const MIN_LEN: usize = 21;

/// Ordered sequence of real-valued observations, optionally paired with
/// opaque time labels of equal length.
///
/// Immutable once constructed. Construction validates length, finiteness of
/// every value, and label pairing; downstream code can therefore assume a
/// well-formed series.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    values: Vec<f64>,
    labels: Option<Vec<String>>,
}

impl TimeSeries {
    /// Create a series without time labels.
    ///
    /// # Errors
    /// Returns an error if fewer than [`MIN_LEN`] observations are given or
    /// any observation is NaN or infinite.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        Self::with_labels(values, None)
    }

    /// Create a series with optional time labels.
    ///
    /// # Errors
    /// As [`TimeSeries::new`], plus an error if the label count does not
    /// match the value count.
    pub fn with_labels(values: Vec<f64>, labels: Option<Vec<String>>) -> Result<Self> {
        if values.len() < MIN_LEN {
            return Err(Error::SeriesTooShort {
                needed: MIN_LEN,
                got: values.len(),
            });
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, val)| !val.is_finite())
        {
            return Err(Error::NonFiniteValue { index, value });
        }
        if let Some(labels) = &labels
            && labels.len() != values.len()
        {
            return Err(Error::LabelMismatch {
                labels: labels.len(),
                values: values.len(),
            });
        }
        Ok(Self { values, labels })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Split the observations into the regimes before and after `tau`.
    pub fn split(&self, tau: usize) -> (&[f64], &[f64]) {
        self.values.split_at(tau)
    }

    pub fn mean(&self) -> f64 {
        compute_mean(&self.values)
    }

    pub fn std_dev(&self) -> f64 {
        compute_var(&self.values).sqrt()
    }
}
