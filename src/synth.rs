//! Synthetic two-regime series generation.

use crate::error::{Error, Result};
use crate::series::TimeSeries;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Normal;

/// Generate a series with `change_point` observations from N(mu1, sigma)
/// followed by `n - change_point` observations from N(mu2, sigma), drawn
/// from an explicitly seeded generator.
///
/// A `sigma` of zero produces the noiseless step.
///
/// # Errors
/// Returns an error if `change_point` does not split the series interior,
/// `sigma` is negative or non-finite, or the series would be too short.
pub fn two_regime(
    n: usize,
    change_point: usize,
    mu1: f64,
    mu2: f64,
    sigma: f64,
    seed: u64,
) -> Result<TimeSeries> {
    if change_point == 0 || change_point >= n {
        return Err(Error::InvalidParameter {
            name: "change_point",
            reason: format!("must split the series interior, got {change_point} of {n}"),
        });
    }

    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma)?;
    let values = (0..n)
        .map(|i| {
            let mean = if i < change_point { mu1 } else { mu2 };
            mean + noise.sample(&mut rng)
        })
        .collect();

    TimeSeries::new(values)
}
