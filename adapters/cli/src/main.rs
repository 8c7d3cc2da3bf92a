#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Prophecy session.

mod content;
mod runner;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use content::Content;
use runner::Runner;
use settings::{RunnerSettings, Settings};

/// Runs the simulation with scripted input and prints what happened.
#[derive(Debug, Parser)]
#[command(name = "prophecy", version, about)]
struct Args {
    /// TOML settings file; every key is optional.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Content directory holding `rooms/` and `animations/`.
    #[arg(long)]
    content: Option<PathBuf>,
    /// Number of simulation steps to run.
    #[arg(long)]
    ticks: Option<u64>,
    /// Simulation steps per second.
    #[arg(long)]
    tick_rate: Option<u32>,
    /// Seed of the boss pattern choices.
    #[arg(long)]
    seed: Option<u64>,
    /// Sessions to rebuild after the first one ends.
    #[arg(long)]
    restarts: Option<u32>,
    /// Compose a frame every N steps.
    #[arg(long)]
    render_every: Option<u64>,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn override_runner(&self, runner: &mut RunnerSettings) {
        if let Some(content) = &self.content {
            runner.content = content.clone();
        }
        if let Some(ticks) = self.ticks {
            runner.ticks = ticks;
        }
        if let Some(tick_rate) = self.tick_rate.filter(|rate| *rate > 0) {
            runner.tick_rate = tick_rate;
        }
        if let Some(seed) = self.seed {
            runner.seed = seed;
        }
        if let Some(restarts) = self.restarts {
            runner.restarts = restarts;
        }
        if let Some(render_every) = self.render_every {
            runner.render_every = render_every;
        }
    }
}

/// Entry point for the Prophecy command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let mut settings = Settings::load(args.config.as_deref())?;
    args.override_runner(&mut settings.runner);
    info!(
        content = %settings.runner.content.display(),
        ticks = settings.runner.ticks,
        seed = settings.runner.seed,
        "starting session"
    );

    let content = Content::load(&settings.runner.content)
        .with_context(|| format!("failed to load {}", settings.runner.content.display()))?;
    let summary = Runner::new(settings, content)?.run()?;
    println!("{summary}");
    Ok(())
}

fn init_tracing(fallback: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .with_context(|| format!("invalid log filter '{fallback}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(anyhow::Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_settings() {
        let args = Args::parse_from([
            "prophecy",
            "--ticks",
            "10",
            "--seed",
            "4",
            "--tick-rate",
            "0",
            "--content",
            "assets",
        ]);
        let mut runner = RunnerSettings::default();
        args.override_runner(&mut runner);
        assert_eq!(runner.ticks, 10);
        assert_eq!(runner.seed, 4);
        assert_eq!(runner.tick_rate, 60, "a zero rate is ignored");
        assert_eq!(runner.content, PathBuf::from("assets"));
        assert_eq!(args.log_level, "info");
    }
}
