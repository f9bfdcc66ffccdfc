use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use log::debug;
use rand::Rng;
use twenty48_core::engine::{Game, Move, Status};

const HELP: &str = "commands: w/a/s/d, h/j/k/l or up/left/down/right, start, r/restart, q/quit, ?/help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Move(Move),
    Start,
    Restart,
    Help,
    Quit,
}

fn parse_command(input: &str) -> Option<Command> {
    let cmd = match input.trim().to_ascii_lowercase().as_str() {
        "w" | "k" | "up" => Command::Move(Move::Up),
        "s" | "j" | "down" => Command::Move(Move::Down),
        "a" | "h" | "left" => Command::Move(Move::Left),
        "d" | "l" | "right" => Command::Move(Move::Right),
        "start" => Command::Start,
        "r" | "restart" => Command::Restart,
        "?" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Drive `game` from line-oriented `input` until quit or end of input.
///
/// The board is redrawn after start/restart and after every move that
/// changed it; rejected moves only print a short notice.
pub fn run<G: Rng, I: BufRead, W: Write>(
    game: &mut Game<G>,
    input: I,
    out: &mut W,
    json: bool,
) -> Result<()> {
    writeln!(out, "{HELP}")?;
    render(game, out, json)?;
    for line in input.lines() {
        let line = line.context("failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(cmd) = parse_command(&line) else {
            writeln!(out, "unknown command '{}' ({HELP})", line.trim())?;
            continue;
        };
        debug!("command {cmd:?}");
        match cmd {
            Command::Move(dir) => {
                let before = game.status();
                if game.apply(dir) {
                    render(game, out, json)?;
                } else if game.status() != before {
                    writeln!(out, "no moves left")?;
                    render_status(game, out)?;
                } else {
                    writeln!(out, "{dir}: nothing moved")?;
                }
            }
            Command::Start => {
                game.start();
                render(game, out, json)?;
            }
            Command::Restart => {
                game.restart();
                render(game, out, json)?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => break,
        }
    }
    writeln!(out, "final score: {}", game.score())?;
    Ok(())
}

fn render<G: Rng, W: Write>(game: &Game<G>, out: &mut W, json: bool) -> Result<()> {
    if json {
        let state = serde_json::to_string(&game.state()).context("failed to encode state")?;
        writeln!(out, "{state}")?;
    } else {
        write!(out, "{}", game.board())?;
    }
    render_status(game, out)
}

fn render_status<G: Rng, W: Write>(game: &Game<G>, out: &mut W) -> Result<()> {
    writeln!(out, "Score: {} | Status: {}", game.score(), game.status())?;
    match game.status() {
        Status::NotStarted => writeln!(out, "type 'start' to begin")?,
        Status::Won => writeln!(out, "You win! type 'restart' to play again")?,
        Status::Lost => writeln!(out, "Game over. type 'restart' to play again")?,
        Status::Playing => {}
    }
    Ok(())
}
