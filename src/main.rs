mod config;

use crate::config::Config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use frangere::grid::{self, GridConfig, GridEstimate};
use frangere::model::ChangePointModel;
use frangere::monitor::LogMonitor;
use frangere::sampler::{McmcEstimate, Sampler, SamplerConfig};
use frangere::summary::RegimeSummary;
use frangere::synth;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde_json::json;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Analysis configuration file (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Approximate the posterior by exhaustive grid evaluation.
    Grid,

    /// Draw a posterior chain with Metropolis-Hastings.
    Sample,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = Cli::parse();
    log::info!("{args:#?}");

    let cfg = Config::from_file(&args.config).context("failed to construct cfg")?;
    log::info!("{cfg:#?}");

    let series = synth::two_regime(
        cfg.series.n,
        cfg.series.change_point,
        cfg.series.mu1,
        cfg.series.mu2,
        cfg.series.sigma,
        cfg.series.seed,
    )
    .context("failed to generate series")?;

    let model = ChangePointModel::new(series).context("failed to construct model")?;

    let report = match args.command {
        Command::Grid => run_grid(&model, &cfg)?,
        Command::Sample => run_sample(&model, &cfg)?,
    };

    write_report(&report, args.out.as_deref()).context("failed to write report")?;

    Ok(())
}

fn run_grid(model: &ChangePointModel, cfg: &Config) -> Result<serde_json::Value> {
    let grid_cfg = GridConfig {
        resolution: cfg.grid.resolution,
    };

    let mut monitor = LogMonitor::new(1);
    let estimate =
        grid::estimate(model, &grid_cfg, &mut monitor).context("failed to estimate posterior")?;

    let GridEstimate { map, tau, mu1, mu2 } = estimate;
    log::info!(
        "MAP estimate: tau = {}, mu1 = {:.4}, mu2 = {:.4}, sigma = {:.4}",
        map.params.tau,
        map.params.mu1,
        map.params.mu2,
        map.params.sigma
    );

    let summary = RegimeSummary::new(model.series(), &map.params)
        .context("failed to summarize regimes")?;

    Ok(json!({
        "estimator": "grid",
        "priors": model.priors(),
        "map": map,
        "marginals": { "tau": tau, "mu1": mu1, "mu2": mu2 },
        "summary": summary.report(),
    }))
}

fn run_sample(model: &ChangePointModel, cfg: &Config) -> Result<serde_json::Value> {
    let sampler_cfg = SamplerConfig {
        n_samples: cfg.mcmc.n_samples,
        burn_in: cfg.mcmc.burn_in,
        tau_step: cfg.mcmc.tau_step,
        mu_step: cfg.mcmc.mu_step,
        sigma_step: cfg.mcmc.sigma_step,
    };

    let rng = ChaCha12Rng::seed_from_u64(cfg.mcmc.seed);
    let mut sampler = Sampler::new(sampler_cfg, rng).context("failed to construct sampler")?;

    let mut monitor = LogMonitor::default();
    let estimate = sampler
        .run(model, &mut monitor)
        .context("failed to sample posterior")?;

    log::info!(
        "posterior means: tau = {:.1}, mu1 = {:.4}, mu2 = {:.4}, sigma = {:.4}",
        estimate.tau.mean,
        estimate.mu1.mean,
        estimate.mu2.mean,
        estimate.sigma.mean
    );
    log::info!(
        "R-hat: tau = {:.4}, mu1 = {:.4}, mu2 = {:.4}",
        estimate.r_hat.tau,
        estimate.r_hat.mu1,
        estimate.r_hat.mu2
    );

    let summary = RegimeSummary::new(model.series(), &estimate.point_estimate())
        .context("failed to summarize regimes")?;

    let McmcEstimate {
        chain,
        tau,
        mu1,
        mu2,
        sigma,
        r_hat,
        acceptance_rate,
    } = estimate;

    Ok(json!({
        "estimator": "mcmc",
        "priors": model.priors(),
        "estimate": { "tau": tau, "mu1": mu1, "mu2": mu2, "sigma": sigma },
        "r_hat": r_hat,
        "acceptance_rate": acceptance_rate,
        "chain": chain,
        "summary": summary.report(),
    }))
}

fn write_report(report: &serde_json::Value, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("failed to create {path:?}"))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, report)
                .context("failed to serialize report")?;
            writer.flush().context("failed to flush writer stream")?;
        }
        None => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}
