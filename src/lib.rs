//! Bayesian estimation of a single structural break in a univariate time
//! series.
//!
//! A two-regime model (a change point `tau` separating Normal regimes with
//! means `mu1` and `mu2` and a shared noise scale `sigma`) is evaluated
//! through one joint log-posterior, approximated either by exhaustive grid
//! evaluation or by a random-walk Metropolis-Hastings chain, and checked
//! with the Gelman-Rubin convergence diagnostic.
//!
//! The crate exposes a programmatic contract only: callers construct a
//! [`series::TimeSeries`], build a [`model::ChangePointModel`] from it, run
//! [`grid::estimate`] or a [`sampler::Sampler`], and receive plain numeric
//! records that serialize losslessly to JSON.

pub mod diagnostics;
pub mod error;
pub mod grid;
pub mod model;
pub mod monitor;
pub mod sampler;
pub mod series;
pub mod stats;
pub mod summary;
pub mod synth;

pub use error::{Error, Result};
