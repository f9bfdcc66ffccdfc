mod config;
mod play;
mod selfplay;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use twenty48_core::engine::{Board, Game};

use config::{Config, Policy};
use selfplay::SelfplayOptions;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Play 2048 in the terminal or run self-play batches"
)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play interactively, one command per line on stdin
    Play {
        /// Seed for tile spawns (overrides [game].seed)
        #[arg(long, value_name = "N")]
        seed: Option<u64>,
        /// Starting board, rows separated by '/', e.g. "2 2 0 0/0 0 0 0/0 0 0 0/0 0 0 0"
        #[arg(long, value_name = "BOARD")]
        board: Option<String>,
        /// Print each state as JSON cell views instead of the ASCII board
        #[arg(long)]
        json: bool,
    },
    /// Play a batch of games with a fixed policy and report a summary
    Selfplay {
        /// Number of games
        #[arg(long, value_name = "N")]
        games: Option<usize>,
        /// Base seed; game i uses seed + i
        #[arg(long, value_name = "N")]
        seed: Option<u64>,
        /// Move selection policy
        #[arg(long, value_enum)]
        policy: Option<Policy>,
        /// Stop a game after this many board-changing moves
        #[arg(long, value_name = "N")]
        max_steps: Option<u64>,
        /// Number of worker threads (defaults to Rayon default)
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Write per-game results as JSON
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cfg = match &cli.config {
        Some(path) => {
            info!("Using configuration file: {}", path.display());
            Config::from_toml(path)?
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Play { seed, board, json } => {
            let initial = match board {
                Some(text) => Some(
                    text.parse::<Board>()
                        .with_context(|| format!("invalid --board '{text}'"))?,
                ),
                None => cfg.game.initial_board()?,
            };
            let rng = match seed.or(cfg.game.seed) {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            let mut game = match initial {
                Some(b) => Game::from_board_with_rng(b, rng),
                None => Game::with_rng(rng),
            };
            let stdin = io::stdin();
            let mut stdout = io::stdout().lock();
            play::run(&mut game, stdin.lock(), &mut stdout, json)
        }
        Command::Selfplay {
            games,
            seed,
            policy,
            max_steps,
            workers,
            output,
            quiet,
        } => {
            let sp = cfg.selfplay;
            let opts = SelfplayOptions {
                games: games.unwrap_or(sp.games),
                max_steps: max_steps.unwrap_or(sp.max_steps),
                policy: policy.unwrap_or(sp.policy),
                seed: seed.unwrap_or(sp.seed),
                workers: workers.or(sp.workers),
                results_file: output.or(sp.results_file),
                progress: !quiet,
            };
            selfplay::run(&opts).map(|_| ())
        }
    }
}
