//! Human-interpretable derivations from an estimated parameter set.

use crate::error::{Error, Result};
use crate::model::ParameterSet;
use crate::series::TimeSeries;
use crate::stats::compute_var;
use serde::{Deserialize, Serialize};

/// Regime comparison derived from an estimate and the raw data slices.
///
/// The per-regime standard deviations come from the split raw data, not from
/// the model's shared sigma. Ratio quantities are computed lazily: a zero
/// denominator only fails the call that asks for the affected quantity.
#[derive(Debug, Clone)]
pub struct RegimeSummary {
    mu1: f64,
    mu2: f64,
    std_before: f64,
    std_after: f64,
}

impl RegimeSummary {
    /// Split the series at the estimated change point and measure both
    /// regimes.
    ///
    /// # Errors
    /// Returns an error if `tau` leaves fewer than two observations on
    /// either side.
    pub fn new(series: &TimeSeries, params: &ParameterSet) -> Result<Self> {
        let n = series.len();
        if params.tau < 2 || params.tau + 2 > n {
            return Err(Error::InvalidParameter {
                name: "tau",
                reason: format!("split at {} leaves a degenerate regime (n = {n})", params.tau),
            });
        }

        let (before, after) = series.split(params.tau);
        Ok(Self {
            mu1: params.mu1,
            mu2: params.mu2,
            std_before: compute_var(before).sqrt(),
            std_after: compute_var(after).sqrt(),
        })
    }

    /// Absolute shift of the regime mean.
    pub fn mean_shift(&self) -> f64 {
        self.mu2 - self.mu1
    }

    /// Relative shift of the regime mean, in percent.
    ///
    /// # Errors
    /// Returns an error when the before-regime mean is exactly zero; use
    /// [`RegimeSummary::mean_shift`] for the absolute convention instead.
    pub fn percent_change(&self) -> Result<f64> {
        if self.mu1 == 0.0 {
            return Err(Error::ZeroDenominator {
                quantity: "percent change",
            });
        }
        Ok((self.mu2 - self.mu1) / self.mu1.abs() * 100.0)
    }

    pub fn std_before(&self) -> f64 {
        self.std_before
    }

    pub fn std_after(&self) -> f64 {
        self.std_after
    }

    /// Relative change of the raw-data spread across the split, in percent.
    ///
    /// # Errors
    /// Returns an error when the before-regime standard deviation is exactly
    /// zero.
    pub fn volatility_change(&self) -> Result<f64> {
        if self.std_before == 0.0 {
            return Err(Error::ZeroDenominator {
                quantity: "volatility change",
            });
        }
        Ok((self.std_after - self.std_before) / self.std_before * 100.0)
    }

    /// Serializable report. Quantities with a zero denominator are logged
    /// and rendered as explicit nulls rather than NaN.
    pub fn report(&self) -> SummaryReport {
        SummaryReport {
            mean_shift: self.mean_shift(),
            percent_change: self.percent_change().map_err(log_skipped).ok(),
            std_before: self.std_before,
            std_after: self.std_after,
            volatility_change: self.volatility_change().map_err(log_skipped).ok(),
        }
    }
}

fn log_skipped(error: Error) -> Error {
    log::warn!("skipping derived quantity: {error}");
    error
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub mean_shift: f64,
    pub percent_change: Option<f64>,
    pub std_before: f64,
    pub std_after: f64,
    pub volatility_change: Option<f64>,
}
