//! Runner settings read from an optional TOML file and overridden by flags.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use prophecy_world::WorldConfig;
use serde::Deserialize;

/// Everything the runner needs to build and drive a session.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// World tuning passed to `World::new`.
    pub(crate) world: WorldConfig,
    /// Loop options.
    pub(crate) runner: RunnerSettings,
}

/// Options of the fixed-timestep loop.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct RunnerSettings {
    /// Simulation steps per second.
    pub(crate) tick_rate: u32,
    /// Number of steps to run before stopping.
    pub(crate) ticks: u64,
    /// Seed of the boss pattern choices.
    pub(crate) seed: u64,
    /// Directory holding `rooms/` and `animations/`.
    pub(crate) content: PathBuf,
    /// Rebuild the session this many times after it ends.
    pub(crate) restarts: u32,
    /// Compose a frame every this many steps; zero never draws.
    pub(crate) render_every: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            ticks: 3_600,
            seed: 0,
            content: PathBuf::from("content"),
            restarts: 0,
            render_every: 0,
        }
    }
}

impl Settings {
    /// Reads `path`, or returns the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        if settings.runner.tick_rate == 0 {
            anyhow::bail!("runner.tick_rate must be positive");
        }
        Ok(settings)
    }
}
