use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qtrainer::agent::DqnAgent;
use qtrainer::config::Hyperparameters;
use qtrainer::environment::EnvRegistry;

/// Train or evaluate a DQN agent on a registered environment.
#[derive(Parser, Debug)]
#[command(name = "qtrainer", version)]
struct Cli {
    /// Name of the hyperparameter set (a table in the config file)
    hyperparameter_set: String,

    /// Path to the hyperparameter file
    #[arg(short, long, default_value = "hyperparameters.toml")]
    config: PathBuf,

    /// Stop after this many episodes (at least 1); runs until interrupted when omitted
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    episodes: Option<u64>,

    /// Seed for the agent and environment; overrides the set's `seed`
    #[arg(short, long)]
    seed: Option<u64>,

    /// Act greedily without storing transitions or updating the network
    #[arg(long)]
    eval: bool,

    /// Write per-episode metrics as JSON when the run ends
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let hyperparameters = Hyperparameters::load(&cli.config, &cli.hyperparameter_set)
        .with_context(|| format!("loading '{}' from {}", cli.hyperparameter_set, cli.config.display()))?;
    let seed = cli.seed.or(hyperparameters.seed).unwrap_or_else(rand::random);
    info!(seed, set = %cli.hyperparameter_set, env = %hyperparameters.env_id, "starting run");

    let registry = EnvRegistry::with_defaults();
    let mut env = registry
        .make(&hyperparameters.env_id, seed)
        .with_context(|| format!("available environments: {:?}", registry.list()))?;

    let mut agent = DqnAgent::for_environment(hyperparameters, env.as_ref(), seed)?;
    let is_training = !cli.eval;
    let result = agent.run_until(&mut env, is_training, |summary| {
        cli.episodes.map_or(false, |limit| summary.episode as u64 + 1 >= limit)
    });

    if let Some(path) = &cli.metrics_out {
        agent
            .metrics()
            .save_json(path)
            .with_context(|| format!("writing metrics to {}", path.display()))?;
    }
    result?;

    if let Some(mean) = agent.metrics().mean_recent_reward(100) {
        info!(episodes = agent.episodes(), mean_reward_last_100 = mean, "run finished");
    }
    Ok(())
}
