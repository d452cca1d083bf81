//! Error types for change-point analysis.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a model or deriving results.
///
/// Rejected sampler proposals and out-of-support parameter sets are not
/// errors: they map to a `-inf` log-posterior and are handled by the
/// acceptance rule.
#[derive(Error, Debug)]
pub enum Error {
    /// Series too short for a valid change-point range.
    #[error("series too short: need at least {needed} observations, got {got}")]
    SeriesTooShort { needed: usize, got: usize },

    /// Constant series: the data-derived scale priors would be ill-defined.
    #[error("series is constant: scale priors need nonzero variance")]
    ConstantSeries,

    /// A NaN or infinite observation in the input.
    #[error("non-finite value {value} at index {index}")]
    NonFiniteValue { index: usize, value: f64 },

    /// Time labels do not pair up with the observations.
    #[error("label count {labels} does not match value count {values}")]
    LabelMismatch { labels: usize, values: usize },

    /// An estimator or summarizer parameter outside its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A random-walk proposal distribution could not be constructed.
    #[error("invalid proposal distribution: {0}")]
    ProposalDistribution(#[from] rand_distr::NormalError),

    /// A derived ratio whose denominator is exactly zero.
    #[error("zero denominator computing {quantity}")]
    ZeroDenominator { quantity: &'static str },

    /// Every grid cell has zero posterior mass; no MAP cell exists.
    #[error("posterior mass is zero over the entire grid")]
    EmptyPosterior,

    /// The injected monitor requested cancellation mid-run.
    #[error("cancelled after {done} of {total} steps")]
    Cancelled { done: usize, total: usize },
}
