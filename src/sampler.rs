//! Random-walk Metropolis-Hastings sampler for the change-point posterior.
//!
//! The chain is inherently sequential: each state depends on the previous
//! one, so a single chain cannot be parallelized. Independent chains (for
//! convergence diagnostics) can run concurrently against one model.

use crate::diagnostics::{self, RHat};
use crate::error::{Error, Result};
use crate::model::{ChangePointModel, ParameterSet, TAU_MARGIN};
use crate::monitor::Monitor;
use crate::stats::{Accumulator, AccumulatorReport, compute_mean, compute_var};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// Sampler settings: chain length, burn-in, and random-walk step sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub n_samples: usize,
    pub burn_in: usize,
    pub tau_step: usize,
    pub mu_step: f64,
    pub sigma_step: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_samples: 10_000,
            burn_in: 1_000,
            tau_step: 5,
            mu_step: 1.0,
            sigma_step: 0.5,
        }
    }
}

impl SamplerConfig {
    fn validate(&self) -> Result<()> {
        if self.n_samples < 2 {
            return Err(Error::InvalidParameter {
                name: "n_samples",
                reason: format!("must be at least 2, got {}", self.n_samples),
            });
        }
        if self.tau_step == 0 {
            return Err(Error::InvalidParameter {
                name: "tau_step",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.mu_step > 0.0) {
            return Err(Error::InvalidParameter {
                name: "mu_step",
                reason: format!("must be positive, got {}", self.mu_step),
            });
        }
        if !(self.sigma_step > 0.0) {
            return Err(Error::InvalidParameter {
                name: "sigma_step",
                reason: format!("must be positive, got {}", self.sigma_step),
            });
        }
        Ok(())
    }
}

/// Posterior sample chain: four parallel vectors in sampling order,
/// burn-in excluded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Chain {
    pub tau: Vec<usize>,
    pub mu1: Vec<f64>,
    pub mu2: Vec<f64>,
    pub sigma: Vec<f64>,
}

impl Chain {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            tau: Vec::with_capacity(capacity),
            mu1: Vec::with_capacity(capacity),
            mu2: Vec::with_capacity(capacity),
            sigma: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, state: &ParameterSet) {
        self.tau.push(state.tau);
        self.mu1.push(state.mu1);
        self.mu2.push(state.mu2);
        self.sigma.push(state.sigma);
    }

    pub fn len(&self) -> usize {
        self.tau.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tau.is_empty()
    }
}

/// Sampler output: the chain, per-parameter posterior mean and spread,
/// convergence diagnostics, and the overall acceptance rate.
#[derive(Debug, Clone, Serialize)]
pub struct McmcEstimate {
    pub chain: Chain,
    pub tau: AccumulatorReport,
    pub mu1: AccumulatorReport,
    pub mu2: AccumulatorReport,
    pub sigma: AccumulatorReport,
    pub r_hat: RHat,
    pub acceptance_rate: f64,
}

impl McmcEstimate {
    /// Posterior-mean parameter set, with tau rounded to the nearest index.
    pub fn point_estimate(&self) -> ParameterSet {
        ParameterSet {
            tau: self.tau.mean.round() as usize,
            mu1: self.mu1.mean,
            mu2: self.mu2.mean,
            sigma: self.sigma.mean,
        }
    }
}

/// Metropolis-Hastings sampler with an injected random source.
///
/// The generator is passed in explicitly so runs are reproducible: identical
/// configurations and identically seeded generators produce identical
/// chains.
pub struct Sampler {
    cfg: SamplerConfig,
    rng: ChaCha12Rng,
    mu_walk: Normal<f64>,
    sigma_walk: Normal<f64>,
}

impl Sampler {
    pub fn new(cfg: SamplerConfig, rng: ChaCha12Rng) -> Result<Self> {
        cfg.validate()?;
        let mu_walk = Normal::new(0.0, cfg.mu_step)?;
        let sigma_walk = Normal::new(0.0, cfg.sigma_step)?;
        Ok(Self {
            cfg,
            rng,
            mu_walk,
            sigma_walk,
        })
    }

    /// Draw a chain of exactly `n_samples` states from the model posterior.
    ///
    /// Runs `n_samples + burn_in` iterations. A rejected proposal re-records
    /// the current state rather than dropping it, which preserves the
    /// stationary-distribution weighting; out-of-support proposals get a
    /// `-inf` log-posterior and are rejected through the same rule.
    ///
    /// # Errors
    /// Returns an error only on invalid configuration or cancellation;
    /// rejections are a normal part of the algorithm.
    pub fn run(
        &mut self,
        model: &ChangePointModel,
        monitor: &mut dyn Monitor,
    ) -> Result<McmcEstimate> {
        let n = model.series().len();
        let total = self.cfg.n_samples + self.cfg.burn_in;

        let mut current = initial_state(model);
        let mut current_log_post = model.log_posterior(&current);
        let mut chain = Chain::with_capacity(self.cfg.n_samples);
        let mut accepted = 0usize;

        for iter in 0..total {
            if monitor.cancelled() {
                return Err(Error::Cancelled { done: iter, total });
            }

            let proposed = self.propose(&current, n);
            let proposed_log_post = model.log_posterior(&proposed);

            let log_ratio = proposed_log_post - current_log_post;
            if self.rng.random::<f64>().ln() < log_ratio {
                current = proposed;
                current_log_post = proposed_log_post;
                accepted += 1;
            }

            if iter >= self.cfg.burn_in {
                chain.push(&current);
            }
            monitor.progress(iter + 1, total);
        }

        Ok(summarize(chain, accepted, total))
    }

    fn propose(&mut self, current: &ParameterSet, n: usize) -> ParameterSet {
        let tau_step = self.cfg.tau_step as i64;
        let jump = self.rng.random_range(-tau_step..=tau_step);
        let tau = (current.tau as i64 + jump).clamp(TAU_MARGIN as i64, (n - TAU_MARGIN) as i64);

        // Sigma reflects at zero instead of being rejected, so the walk stays
        // on the positive half-line.
        ParameterSet {
            tau: tau as usize,
            mu1: current.mu1 + self.mu_walk.sample(&mut self.rng),
            mu2: current.mu2 + self.mu_walk.sample(&mut self.rng),
            sigma: (current.sigma + self.sigma_walk.sample(&mut self.rng)).abs(),
        }
    }
}

/// Start at the midpoint split with the empirical half means and overall
/// spread.
fn initial_state(model: &ChangePointModel) -> ParameterSet {
    let values = model.series().values();
    let tau = values.len() / 2;
    ParameterSet {
        tau,
        mu1: compute_mean(&values[..tau]),
        mu2: compute_mean(&values[tau..]),
        sigma: compute_var(values).sqrt(),
    }
}

fn summarize(chain: Chain, accepted: usize, total: usize) -> McmcEstimate {
    let tau_samples: Vec<f64> = chain.tau.iter().map(|&tau| tau as f64).collect();
    let r_hat = RHat {
        tau: diagnostics::gelman_rubin(&tau_samples, diagnostics::DEFAULT_CHAINS),
        mu1: diagnostics::gelman_rubin(&chain.mu1, diagnostics::DEFAULT_CHAINS),
        mu2: diagnostics::gelman_rubin(&chain.mu2, diagnostics::DEFAULT_CHAINS),
    };
    McmcEstimate {
        tau: report_of(&tau_samples),
        mu1: report_of(&chain.mu1),
        mu2: report_of(&chain.mu2),
        sigma: report_of(&chain.sigma),
        r_hat,
        acceptance_rate: accepted as f64 / total as f64,
        chain,
    }
}

fn report_of(samples: &[f64]) -> AccumulatorReport {
    let mut acc = Accumulator::new();
    for &sample in samples {
        acc.add(sample);
    }
    acc.report()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::NullMonitor;
    use crate::series::TimeSeries;

    fn step_model(n: usize, split: usize, level: f64) -> ChangePointModel {
        let values: Vec<f64> = (0..n)
            .map(|i| {
                let mean = if i < split { 0.0 } else { level };
                mean + (i % 5) as f64 * 0.01
            })
            .collect();
        ChangePointModel::new(TimeSeries::new(values).unwrap()).unwrap()
    }

    fn run_sampler(cfg: SamplerConfig, seed: u64, model: &ChangePointModel) -> McmcEstimate {
        let mut sampler = Sampler::new(cfg, ChaCha12Rng::seed_from_u64(seed)).unwrap();
        sampler.run(model, &mut NullMonitor).unwrap()
    }

    #[test]
    fn rejects_degenerate_configuration() {
        let rng = ChaCha12Rng::seed_from_u64(0);
        let cfg = SamplerConfig {
            n_samples: 1,
            ..Default::default()
        };
        assert!(matches!(
            Sampler::new(cfg, rng.clone()),
            Err(Error::InvalidParameter { name: "n_samples", .. })
        ));

        let cfg = SamplerConfig {
            mu_step: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Sampler::new(cfg, rng),
            Err(Error::InvalidParameter { name: "mu_step", .. })
        ));
    }

    #[test]
    fn chain_has_exactly_n_samples() {
        let model = step_model(50, 25, 3.0);
        let cfg = SamplerConfig {
            n_samples: 321,
            burn_in: 40,
            ..Default::default()
        };
        let estimate = run_sampler(cfg, 5, &model);
        assert_eq!(estimate.chain.len(), 321);
        assert_eq!(estimate.chain.mu1.len(), 321);
        assert_eq!(estimate.chain.sigma.len(), 321);
    }

    #[test]
    fn identical_seeds_produce_identical_chains() {
        let model = step_model(60, 30, 3.0);
        let cfg = SamplerConfig {
            n_samples: 200,
            burn_in: 50,
            ..Default::default()
        };
        let first = run_sampler(cfg.clone(), 42, &model);
        let second = run_sampler(cfg, 42, &model);
        assert_eq!(first.chain.tau, second.chain.tau);
        assert_eq!(first.chain.mu1, second.chain.mu1);
        assert_eq!(first.chain.mu2, second.chain.mu2);
        assert_eq!(first.chain.sigma, second.chain.sigma);
    }

    #[test]
    fn oversized_tau_steps_are_clipped_to_the_interior() {
        let model = step_model(50, 25, 3.0);
        let cfg = SamplerConfig {
            n_samples: 300,
            burn_in: 20,
            tau_step: 100,
            ..Default::default()
        };
        let estimate = run_sampler(cfg, 9, &model);
        assert!(
            estimate
                .chain
                .tau
                .iter()
                .all(|&tau| tau > TAU_MARGIN && tau < 50 - TAU_MARGIN)
        );
    }

    struct CancelAfter {
        limit: usize,
        seen: usize,
    }

    impl Monitor for CancelAfter {
        fn progress(&mut self, done: usize, _total: usize) {
            self.seen = done;
        }

        fn cancelled(&self) -> bool {
            self.seen >= self.limit
        }
    }

    #[test]
    fn cancellation_aborts_the_run() {
        let model = step_model(50, 25, 3.0);
        let cfg = SamplerConfig {
            n_samples: 1_000,
            burn_in: 100,
            ..Default::default()
        };
        let mut sampler = Sampler::new(cfg, ChaCha12Rng::seed_from_u64(1)).unwrap();
        let mut monitor = CancelAfter { limit: 10, seen: 0 };
        assert!(matches!(
            sampler.run(&model, &mut monitor),
            Err(Error::Cancelled { done: 10, total: 1_100 })
        ));
    }
}
