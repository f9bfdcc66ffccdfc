//! Engine module: 4x4 2048 board, slide/merge ops, and the `Game` state
//! machine. Public API stays small and ergonomic.
//!
//! - `Board` is the plain 4x4 grid value with useful methods.
//! - `Game` owns a board, score, status and random source.
//! - Free functions mirror the methods when convenient (e.g., `shift`).

mod error;
mod game;
mod ops;
pub mod state;

pub use error::BoardError;
pub use game::Game;
pub use state::{
    Board, CELLS, CellView, Grid, GridView, Line, Move, SIZE, Score, Shifted, Spawn, Status, Tile,
    WINNING_TILE,
};

pub use ops::{SPAWN_TWO_PROBABILITY, can_move, shift};
