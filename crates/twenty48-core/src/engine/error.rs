use thiserror::Error;

use super::state::{SIZE, Tile};

/// Reasons a caller-supplied board is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board has {rows} rows, expected {}", SIZE)]
    RowCount { rows: usize },
    #[error("row {row} has {len} cells, expected {}", SIZE)]
    RowLength { row: usize, len: usize },
    #[error("cell ({row}, {col}) holds {value}, which is neither empty nor a power of two >= 2")]
    InvalidTile { row: usize, col: usize, value: Tile },
    #[error("could not parse board: {0}")]
    Parse(String),
}
