//! Grid-approximation posterior estimator.
//!
//! Evaluates the model log-posterior exhaustively over a discretized
//! four-dimensional parameter grid. Cost is O(G^4 * n) for resolution G and
//! series length n: this is a deliberately expensive batch computation, not
//! an interactive one. Reduce the resolution when responsiveness matters;
//! run it off any latency-sensitive path either way. Cell evaluations are
//! independent of each other, so the sweep could be distributed across
//! workers; the streaming accumulators are the only shared state.

use crate::error::{Error, Result};
use crate::model::{ChangePointModel, ParameterSet, TAU_MARGIN};
use crate::monitor::Monitor;
use serde::{Deserialize, Serialize};

/// Grid estimator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of grid points per parameter axis.
    pub resolution: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { resolution: 100 }
    }
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        if self.resolution < 2 {
            return Err(Error::InvalidParameter {
                name: "resolution",
                reason: format!("must be at least 2, got {}", self.resolution),
            });
        }
        Ok(())
    }
}

/// Maximum-a-posteriori grid cell.
///
/// Ties are broken by grid enumeration order: the first maximum encountered
/// wins.
#[derive(Debug, Clone, Serialize)]
pub struct MapEstimate {
    pub params: ParameterSet,
    pub log_posterior: f64,
}

/// Discrete marginal posterior over one parameter axis, normalized to sum
/// to 1.
#[derive(Debug, Clone, Serialize)]
pub struct Marginal {
    pub values: Vec<f64>,
    pub probs: Vec<f64>,
}

/// Full grid estimate: the MAP cell plus marginal posteriors over the
/// change point and the two regime means.
#[derive(Debug, Clone, Serialize)]
pub struct GridEstimate {
    pub map: MapEstimate,
    pub tau: Marginal,
    pub mu1: Marginal,
    pub mu2: Marginal,
}

/// Streaming log-sum-exp accumulator.
///
/// Keeps a running maximum and a sum of terms rescaled to it, so the grid is
/// never materialized and exponentiation cannot overflow even when the log
/// values span hundreds of orders of magnitude.
struct LogSumExp {
    max: f64,
    sum: f64,
}

impl LogSumExp {
    fn new() -> Self {
        Self {
            max: f64::NEG_INFINITY,
            sum: 0.0,
        }
    }

    fn add(&mut self, log_term: f64) {
        if log_term == f64::NEG_INFINITY {
            return;
        }
        if log_term <= self.max {
            self.sum += (log_term - self.max).exp();
        } else {
            self.sum = self.sum * (self.max - log_term).exp() + 1.0;
            self.max = log_term;
        }
    }

    fn value(&self) -> f64 {
        if self.sum == 0.0 {
            f64::NEG_INFINITY
        } else {
            self.max + self.sum.ln()
        }
    }
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|i| lo + step * i as f64).collect()
}

fn normalize(values: Vec<f64>, accs: &[LogSumExp]) -> Marginal {
    let logs: Vec<f64> = accs.iter().map(LogSumExp::value).collect();
    let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut probs: Vec<f64> = logs
        .iter()
        .map(|&log_weight| {
            if log_weight == f64::NEG_INFINITY {
                0.0
            } else {
                (log_weight - max).exp()
            }
        })
        .collect();
    let total: f64 = probs.iter().sum();
    for prob in &mut probs {
        *prob /= total;
    }
    Marginal { values, probs }
}

/// Approximate the posterior by exhaustive evaluation over `resolution`
/// points per axis.
///
/// The axes cover the prior tau range, the mu prior mean plus/minus two
/// prior standard deviations (for both regime means), and sigma from 0.1 to
/// twice the prior scale. Cells whose truncated tau falls outside the valid
/// interior keep zero posterior mass and are never selected as the MAP.
///
/// Progress is reported per tau slab; cancellation is polled inside the
/// loop.
///
/// # Errors
/// Returns an error for a resolution below 2, on cancellation, or when every
/// cell has zero posterior mass (no integer change point fits the interior).
pub fn estimate(
    model: &ChangePointModel,
    cfg: &GridConfig,
    monitor: &mut dyn Monitor,
) -> Result<GridEstimate> {
    cfg.validate()?;

    let g = cfg.resolution;
    let n = model.series().len();
    let priors = model.priors();

    let tau_axis = linspace(priors.tau_lo, priors.tau_hi, g);
    let mu_lo = priors.mu_mean - 2.0 * priors.mu_std;
    let mu_hi = priors.mu_mean + 2.0 * priors.mu_std;
    let mu1_axis = linspace(mu_lo, mu_hi, g);
    let mu2_axis = mu1_axis.clone();
    let sigma_axis = linspace(0.1, 2.0 * priors.sigma_scale, g);

    let mut tau_accs: Vec<LogSumExp> = (0..g).map(|_| LogSumExp::new()).collect();
    let mut mu1_accs: Vec<LogSumExp> = (0..g).map(|_| LogSumExp::new()).collect();
    let mut mu2_accs: Vec<LogSumExp> = (0..g).map(|_| LogSumExp::new()).collect();
    let mut best: Option<MapEstimate> = None;

    for (i, &tau_val) in tau_axis.iter().enumerate() {
        let tau = tau_val as usize;
        if tau > TAU_MARGIN && tau + TAU_MARGIN < n {
            for (j, &mu1) in mu1_axis.iter().enumerate() {
                if monitor.cancelled() {
                    return Err(Error::Cancelled { done: i, total: g });
                }
                for (k, &mu2) in mu2_axis.iter().enumerate() {
                    for &sigma in &sigma_axis {
                        let params = ParameterSet { tau, mu1, mu2, sigma };
                        let log_post = model.log_posterior(&params);
                        tau_accs[i].add(log_post);
                        mu1_accs[j].add(log_post);
                        mu2_accs[k].add(log_post);
                        let best_log_post = best
                            .as_ref()
                            .map_or(f64::NEG_INFINITY, |map| map.log_posterior);
                        if log_post > best_log_post {
                            best = Some(MapEstimate {
                                params,
                                log_posterior: log_post,
                            });
                        }
                    }
                }
            }
        }
        monitor.progress(i + 1, g);
    }

    let map = best.ok_or(Error::EmptyPosterior)?;

    Ok(GridEstimate {
        map,
        tau: normalize(tau_axis, &tau_accs),
        mu1: normalize(mu1_axis, &mu1_accs),
        mu2: normalize(mu2_axis, &mu2_accs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::NullMonitor;
    use crate::series::TimeSeries;
    use approx::assert_relative_eq;

    fn step_model(n: usize, split: usize, level: f64) -> ChangePointModel {
        let values: Vec<f64> = (0..n).map(|i| if i < split { 0.0 } else { level }).collect();
        ChangePointModel::new(TimeSeries::new(values).unwrap()).unwrap()
    }

    #[test]
    fn log_sum_exp_matches_direct_evaluation() {
        let terms = [-700.0, -699.5, -1000.0, f64::NEG_INFINITY];
        let mut acc = LogSumExp::new();
        for &term in &terms {
            acc.add(term);
        }
        let direct = -700.0
            + terms
                .iter()
                .filter(|term| term.is_finite())
                .map(|term| (term + 700.0).exp())
                .sum::<f64>()
                .ln();
        assert_relative_eq!(acc.value(), direct, epsilon = 1e-12);
    }

    #[test]
    fn rejects_resolution_below_two() {
        let model = step_model(30, 15, 4.0);
        let cfg = GridConfig { resolution: 1 };
        assert!(matches!(
            estimate(&model, &cfg, &mut NullMonitor),
            Err(Error::InvalidParameter { name: "resolution", .. })
        ));
    }

    #[test]
    fn marginals_are_normalized() {
        let model = step_model(30, 15, 4.0);
        let cfg = GridConfig { resolution: 8 };
        let result = estimate(&model, &cfg, &mut NullMonitor).unwrap();

        for marginal in [&result.tau, &result.mu1, &result.mu2] {
            let total: f64 = marginal.probs.iter().sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-6);
            assert_eq!(marginal.values.len(), 8);
        }
    }

    #[test]
    fn map_tau_stays_interior() {
        let model = step_model(40, 20, 4.0);
        let cfg = GridConfig { resolution: 10 };
        let result = estimate(&model, &cfg, &mut NullMonitor).unwrap();
        let tau = result.map.params.tau;
        assert!(tau > TAU_MARGIN && tau < 40 - TAU_MARGIN);
    }

    #[test]
    fn minimum_length_series_has_no_valid_cell() {
        // n = 21 admits no integer tau with more than TAU_MARGIN observations
        // on both sides.
        let values: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let model = ChangePointModel::new(TimeSeries::new(values).unwrap()).unwrap();
        let cfg = GridConfig { resolution: 6 };
        assert!(matches!(
            estimate(&model, &cfg, &mut NullMonitor),
            Err(Error::EmptyPosterior)
        ));
    }

    struct CancelAtOnce;

    impl Monitor for CancelAtOnce {
        fn progress(&mut self, _done: usize, _total: usize) {}

        fn cancelled(&self) -> bool {
            true
        }
    }

    #[test]
    fn cancellation_reports_partial_progress() {
        let model = step_model(40, 20, 4.0);
        let cfg = GridConfig { resolution: 10 };
        assert!(matches!(
            estimate(&model, &cfg, &mut CancelAtOnce),
            Err(Error::Cancelled { total: 10, .. })
        ));
    }
}
