use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Synthetic series to analyze.
    pub series: SeriesConfig,
    /// Grid estimator settings.
    pub grid: GridSection,
    /// Metropolis-Hastings settings.
    pub mcmc: McmcSection,
}

/// Two-regime synthetic series parameters.
#[derive(Debug, Deserialize)]
pub struct SeriesConfig {
    /// Number of observations.
    pub n: usize,
    /// True change-point index.
    pub change_point: usize,
    /// Mean before the change point.
    pub mu1: f64,
    /// Mean after the change point.
    pub mu2: f64,
    /// Noise scale shared by both regimes.
    pub sigma: f64,
    /// Generator seed.
    pub seed: u64,
}

#[derive(Debug, Deserialize)]
pub struct GridSection {
    /// Grid points per parameter axis.
    pub resolution: usize,
}

#[derive(Debug, Deserialize)]
pub struct McmcSection {
    /// Number of recorded samples.
    pub n_samples: usize,
    /// Discarded initial iterations.
    pub burn_in: usize,
    /// Integer random-walk step for tau.
    pub tau_step: usize,
    /// Random-walk step for the regime means.
    pub mu_step: f64,
    /// Random-walk step for sigma.
    pub sigma_step: f64,
    /// Generator seed.
    pub seed: u64,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.series.n, 21..10_000_000).context("invalid series length")?;
        check_num(self.series.change_point, 1..self.series.n)
            .context("invalid change point")?;
        check_num(self.series.sigma, 0.0..1e6).context("invalid series noise scale")?;

        check_num(self.grid.resolution, 2..1_000).context("invalid grid resolution")?;

        check_num(self.mcmc.n_samples, 2..100_000_000).context("invalid number of samples")?;
        check_num(self.mcmc.burn_in, 0..100_000_000).context("invalid burn-in length")?;
        check_num(self.mcmc.tau_step, 1..10_000).context("invalid tau step")?;
        check_num(self.mcmc.mu_step, 0.0..1e6).context("invalid mu step")?;
        check_num(self.mcmc.sigma_step, 0.0..1e6).context("invalid sigma step")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
