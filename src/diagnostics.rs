//! Convergence diagnostics for posterior sample chains.

use crate::stats::{compute_mean, compute_var};
use serde::{Deserialize, Serialize};

/// Default number of sub-chains for the Gelman-Rubin split.
pub const DEFAULT_CHAINS: usize = 4;

/// Gelman-Rubin statistic per scalar parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RHat {
    pub tau: f64,
    pub mu1: f64,
    pub mu2: f64,
}

/// Gelman-Rubin R-hat from one sample sequence split into `n_chains`
/// contiguous equal-length sub-chains (the tail beyond `n_chains * L` is
/// discarded).
///
/// Values close to 1.0 (conventionally below 1.1) indicate adequate mixing.
/// Returns the sentinel 1.0 when there are fewer than `2 * n_chains` samples
/// or the within-chain variance is zero: insufficient evidence to assess
/// convergence, not proof of it.
pub fn gelman_rubin(samples: &[f64], n_chains: usize) -> f64 {
    if n_chains < 2 || samples.len() < 2 * n_chains {
        return 1.0;
    }

    let len = samples.len() / n_chains;
    let chains: Vec<&[f64]> = (0..n_chains)
        .map(|chain| &samples[chain * len..(chain + 1) * len])
        .collect();

    let variances: Vec<f64> = chains.iter().map(|chain| compute_var(chain)).collect();
    let within = compute_mean(&variances);

    let means: Vec<f64> = chains.iter().map(|chain| compute_mean(chain)).collect();
    let between = len as f64 * compute_var(&means);

    if within == 0.0 {
        return 1.0;
    }

    let pooled = (len - 1) as f64 / len as f64 * within + between / len as f64;
    (pooled / within).sqrt()
}
