//! Two-regime change-point model and its log-posterior density.

use crate::error::{Error, Result};
use crate::series::TimeSeries;
use crate::stats::{compute_mean, compute_var, log_half_cauchy, log_normal, log_uniform};
use serde::{Deserialize, Serialize};

/// Interior margin: a change point must leave more than this many
/// observations on each side of the split.
pub const TAU_MARGIN: usize = 10;

/// Prior parameters derived from the data at model construction and frozen
/// thereafter.
///
/// The change point gets a Uniform prior over the middle 60% of the index
/// range, the regime means get a common Normal prior centered on the sample
/// mean, and the noise scale gets a half-Cauchy prior at the sample scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorSpec {
    pub tau_lo: f64,
    pub tau_hi: f64,
    pub mu_mean: f64,
    pub mu_std: f64,
    pub sigma_scale: f64,
}

/// Candidate parameters: change-point index, per-regime means, shared noise
/// scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub tau: usize,
    pub mu1: f64,
    pub mu2: f64,
    pub sigma: f64,
}

/// Two-regime model: Normal observations with mean `mu1` before `tau` and
/// `mu2` from `tau` on, sharing one noise scale `sigma`.
///
/// The model owns the data and the frozen [`PriorSpec`]; it holds no per-run
/// state, so several estimations can run against one model without
/// interference.
pub struct ChangePointModel {
    series: TimeSeries,
    priors: PriorSpec,
}

impl ChangePointModel {
    /// Build the model and derive its priors from the data.
    ///
    /// # Errors
    /// Returns an error if the sample standard deviation is zero (a constant
    /// series leaves the scale priors undefined).
    pub fn new(series: TimeSeries) -> Result<Self> {
        let std_dev = compute_var(series.values()).sqrt();
        if std_dev == 0.0 {
            return Err(Error::ConstantSeries);
        }

        let n = series.len() as f64;
        let priors = PriorSpec {
            tau_lo: 0.2 * n,
            tau_hi: 0.8 * n,
            mu_mean: compute_mean(series.values()),
            mu_std: 2.0 * std_dev,
            sigma_scale: std_dev,
        };

        Ok(Self { series, priors })
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn priors(&self) -> &PriorSpec {
        &self.priors
    }

    /// Joint log-posterior density of the model at `params`.
    ///
    /// Returns `f64::NEG_INFINITY` outside the support (`tau` within
    /// [`TAU_MARGIN`] of either end, or non-positive `sigma`). That is a
    /// zero-probability region, not an error; the estimators treat such
    /// parameter sets as never accepted and never the MAP.
    ///
    /// This is the single source of truth for posterior evaluation: both the
    /// grid estimator and the sampler consume it and add no model logic of
    /// their own.
    pub fn log_posterior(&self, params: &ParameterSet) -> f64 {
        let n = self.series.len();
        if params.tau <= TAU_MARGIN || params.tau + TAU_MARGIN >= n || params.sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }

        let mut log_post = log_uniform(params.tau as f64, self.priors.tau_lo, self.priors.tau_hi);
        if log_post == f64::NEG_INFINITY {
            return log_post;
        }
        log_post += log_normal(params.mu1, self.priors.mu_mean, self.priors.mu_std);
        log_post += log_normal(params.mu2, self.priors.mu_mean, self.priors.mu_std);
        log_post += log_half_cauchy(params.sigma, self.priors.sigma_scale);

        let (before, after) = self.series.split(params.tau);
        for &val in before {
            log_post += log_normal(val, params.mu1, params.sigma);
        }
        for &val in after {
            log_post += log_normal(val, params.mu2, params.sigma);
        }

        log_post
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_model(n: usize) -> ChangePointModel {
        let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
        ChangePointModel::new(TimeSeries::new(values).unwrap()).unwrap()
    }

    #[test]
    fn rejects_constant_series() {
        let series = TimeSeries::new(vec![3.5; 40]).unwrap();
        assert!(matches!(
            ChangePointModel::new(series),
            Err(Error::ConstantSeries)
        ));
    }

    #[test]
    fn derives_priors_from_data() {
        let model = ramp_model(40);
        let priors = model.priors();
        let std_dev = compute_var(model.series().values()).sqrt();
        assert_relative_eq!(priors.tau_lo, 8.0, epsilon = 1e-12);
        assert_relative_eq!(priors.tau_hi, 32.0, epsilon = 1e-12);
        assert_relative_eq!(priors.mu_mean, 19.5, epsilon = 1e-12);
        assert_relative_eq!(priors.mu_std, 2.0 * std_dev, epsilon = 1e-12);
        assert_relative_eq!(priors.sigma_scale, std_dev, epsilon = 1e-12);
    }

    #[test]
    fn support_boundaries_have_zero_mass() {
        let model = ramp_model(40);
        let valid = ParameterSet {
            tau: 20,
            mu1: 10.0,
            mu2: 30.0,
            sigma: 5.0,
        };
        assert!(model.log_posterior(&valid).is_finite());

        for params in [
            ParameterSet { tau: TAU_MARGIN, ..valid },
            ParameterSet { tau: 30, ..valid },
            ParameterSet { sigma: 0.0, ..valid },
            ParameterSet { sigma: -1.0, ..valid },
        ] {
            assert_eq!(model.log_posterior(&params), f64::NEG_INFINITY);
        }
    }

    #[test]
    fn tau_outside_prior_range_has_zero_mass() {
        // n = 60: the interior margin admits tau = 11 but the Uniform prior
        // only covers [12, 48].
        let model = ramp_model(60);
        let params = ParameterSet {
            tau: 11,
            mu1: 10.0,
            mu2: 40.0,
            sigma: 5.0,
        };
        assert_eq!(model.log_posterior(&params), f64::NEG_INFINITY);
    }

    #[test]
    fn log_posterior_prefers_the_true_split() {
        let mut values = vec![0.0; 30];
        values.extend(vec![6.0; 30]);
        values[0] = 0.1;
        let model = ChangePointModel::new(TimeSeries::new(values).unwrap()).unwrap();

        let at_split = ParameterSet {
            tau: 30,
            mu1: 0.0,
            mu2: 6.0,
            sigma: 0.5,
        };
        let off_split = ParameterSet { tau: 24, ..at_split };
        assert!(model.log_posterior(&at_split) > model.log_posterior(&off_split));
    }
}
