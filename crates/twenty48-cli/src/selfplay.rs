use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::Serialize;
use twenty48_core::engine::{Game, Move, Score, Status, Tile};

use crate::config::Policy;

/// Self-play batch settings, resolved from config and CLI flags.
#[derive(Clone, Debug)]
pub struct SelfplayOptions {
    pub games: usize,
    pub max_steps: u64,
    pub policy: Policy,
    pub seed: u64,
    pub workers: Option<usize>,
    pub results_file: Option<PathBuf>,
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub game_id: u64,
    pub seed: u64,
    pub steps: u64,
    pub score: Score,
    pub highest_tile: Tile,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub mean_score: f64,
    pub best_score: Score,
    pub highest_tile: Tile,
}

impl Policy {
    /// Pick a move among the `legal` ones (indexed by `Move::index`).
    pub fn choose(self, legal: &[bool; 4], rng: &mut StdRng) -> Option<Move> {
        match self {
            Policy::Random => {
                let moves: Vec<Move> = Move::ALL.into_iter().filter(|m| legal[m.index()]).collect();
                moves.choose(rng).copied()
            }
            Policy::Corner => [Move::Down, Move::Left, Move::Right, Move::Up]
                .into_iter()
                .find(|m| legal[m.index()]),
        }
    }
}

/// Play one game to completion (or `max_steps` changing moves).
pub fn play_one(game_id: u64, seed: u64, policy: Policy, max_steps: u64) -> GameResult {
    let mut game = Game::seeded(seed);
    // separate stream so the policy does not perturb tile spawns
    let mut policy_rng = StdRng::seed_from_u64(seed.rotate_left(32) ^ 0x2048);
    while !game.status().is_over() && game.moves() < max_steps {
        let legal = game.legal_moves();
        let Some(dir) = policy.choose(&legal, &mut policy_rng) else {
            // settles the status on a stuck board
            game.apply(Move::Left);
            break;
        };
        game.apply(dir);
    }
    GameResult {
        game_id,
        seed,
        steps: game.moves(),
        score: game.score(),
        highest_tile: game.highest_tile(),
        status: game.status(),
    }
}

pub fn summarize(results: &[GameResult]) -> Summary {
    let games = results.len();
    let total: Score = results.iter().map(|r| r.score).sum();
    Summary {
        games,
        wins: results.iter().filter(|r| r.status == Status::Won).count(),
        losses: results.iter().filter(|r| r.status == Status::Lost).count(),
        mean_score: if games == 0 { 0.0 } else { total as f64 / games as f64 },
        best_score: results.iter().map(|r| r.score).max().unwrap_or(0),
        highest_tile: results.iter().map(|r| r.highest_tile).max().unwrap_or(0),
    }
}

/// Run the batch in parallel and optionally write per-game results as JSON.
pub fn run(opts: &SelfplayOptions) -> Result<(Vec<GameResult>, Summary)> {
    if opts.games == 0 {
        bail!("games must be > 0");
    }
    info!(
        "Self-play: {} games, policy {:?}, base seed {}",
        opts.games, opts.policy, opts.seed
    );

    let pb = if opts.progress {
        ProgressBar::new(opts.games as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})",
        )
        .context("invalid progress template")?
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    let process = || -> Vec<GameResult> {
        (0..opts.games)
            .into_par_iter()
            .map(|idx| {
                let result = play_one(
                    idx as u64,
                    opts.seed.wrapping_add(idx as u64),
                    opts.policy,
                    opts.max_steps,
                );
                pb.inc(1);
                result
            })
            .collect()
    };

    let mut results = if let Some(n) = opts.workers {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .context("failed to build rayon thread pool")?
            .install(process)
    } else {
        process()
    };
    pb.finish_with_message("games played");
    results.sort_by_key(|r| r.game_id);

    let summary = summarize(&results);
    info!(
        "Completed {} games: {} won, {} lost, mean score {:.1}, best score {}, highest tile {}",
        summary.games,
        summary.wins,
        summary.losses,
        summary.mean_score,
        summary.best_score,
        summary.highest_tile
    );

    if let Some(path) = &opts.results_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(
            BufWriter::new(file),
            &serde_json::json!({ "summary": &summary, "games": &results }),
        )
        .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote results to {}", path.display());
    }
    Ok((results, summary))
}
