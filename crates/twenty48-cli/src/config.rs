use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use twenty48_core::engine::{Board, Tile};

/// How self-play picks its next move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Uniform over the moves that change the board
    Random,
    /// Fixed preference Down > Left > Right > Up, keeping big tiles in a corner
    Corner,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameSection,
    #[serde(default)]
    pub selfplay: SelfplaySection,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Default)]
pub struct GameSection {
    /// Seed for tile spawns; entropy when omitted.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Deterministic starting board (4 rows of 4 tiles).
    #[serde(default)]
    pub initial_board: Option<Vec<Vec<Tile>>>,
}

impl GameSection {
    /// Validate `initial_board`, if any.
    pub fn initial_board(&self) -> Result<Option<Board>> {
        self.initial_board
            .as_deref()
            .map(|rows| Board::from_rows(rows).context("invalid [game].initial_board"))
            .transpose()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SelfplaySection {
    #[serde(default = "defaults::games")]
    pub games: usize,
    #[serde(default = "defaults::max_steps")]
    pub max_steps: u64,
    #[serde(default = "defaults::policy")]
    pub policy: Policy,
    /// Base seed; game `i` uses `seed + i`.
    #[serde(default)]
    pub seed: u64,
    /// Number of worker threads (defaults to Rayon default)
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub results_file: Option<PathBuf>,
}

impl Default for SelfplaySection {
    fn default() -> Self {
        Self {
            games: defaults::games(),
            max_steps: defaults::max_steps(),
            policy: defaults::policy(),
            seed: 0,
            workers: None,
            results_file: None,
        }
    }
}

impl Config {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(cfg)
    }
}

mod defaults {
    use super::Policy;

    pub fn games() -> usize { 100 }
    pub fn max_steps() -> u64 { 100_000 }
    pub fn policy() -> Policy { Policy::Random }
}
