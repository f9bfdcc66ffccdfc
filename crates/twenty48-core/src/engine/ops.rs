use rand::Rng;

use super::state::{Board, Grid, Line, Move, Score, Shifted, Spawn, SIZE, Tile};

/// Probability that a spawned tile is a 2; otherwise it is a 4.
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;

/// Slide/merge tiles in the given direction. No randomness.
///
/// Every direction runs the same left-merge over each line of the board
/// seen through an [`Axis`] transform, then maps the result back.
pub fn shift(board: Board, direction: Move) -> Shifted {
    let axis = Axis::for_move(direction);
    let mut lines = axis.apply(board.0);
    let mut gained = 0;
    for line in lines.iter_mut() {
        let (merged, line_gain) = merge_line_left(*line);
        *line = merged;
        gained += line_gain;
    }
    let grid = axis.invert(lines);
    Shifted {
        board: Board(grid),
        gained,
        changed: grid != board.0,
    }
}

/// How a direction maps onto the canonical leftward merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    /// Left: rows as-is.
    Identity,
    /// Right: rows reversed.
    Reverse,
    /// Up: columns become rows.
    Transpose,
    /// Down: columns become rows, then reversed.
    TransposeReverse,
}

impl Axis {
    pub(crate) fn for_move(direction: Move) -> Self {
        match direction {
            Move::Left => Axis::Identity,
            Move::Right => Axis::Reverse,
            Move::Up => Axis::Transpose,
            Move::Down => Axis::TransposeReverse,
        }
    }

    pub(crate) fn apply(self, grid: Grid) -> Grid {
        match self {
            Axis::Identity => grid,
            Axis::Reverse => reverse_rows(grid),
            Axis::Transpose => transpose(grid),
            Axis::TransposeReverse => reverse_rows(transpose(grid)),
        }
    }

    pub(crate) fn invert(self, grid: Grid) -> Grid {
        match self {
            Axis::Identity => grid,
            Axis::Reverse => reverse_rows(grid),
            Axis::Transpose => transpose(grid),
            Axis::TransposeReverse => transpose(reverse_rows(grid)),
        }
    }
}

pub(crate) fn transpose(grid: Grid) -> Grid {
    let mut out = [[0; SIZE]; SIZE];
    for (r, line) in grid.iter().enumerate() {
        for (c, &tile) in line.iter().enumerate() {
            out[c][r] = tile;
        }
    }
    out
}

pub(crate) fn reverse_rows(mut grid: Grid) -> Grid {
    for line in grid.iter_mut() {
        line.reverse();
    }
    grid
}

/// Compact a line toward index 0 and merge equal neighbours once.
///
/// Returns the new line and the score gained. A tile produced by a merge is
/// never merged again in the same pass, so `[2, 2, 4, 0]` becomes
/// `[4, 4, 0, 0]`, not `[8, 0, 0, 0]`. A pair whose sum would not fit in a
/// [`Tile`] stays unmerged.
pub(crate) fn merge_line_left(line: Line) -> (Line, Score) {
    let mut tiles: Vec<Tile> = line.into_iter().filter(|&t| t != 0).collect();
    let mut gained = 0;
    let mut i = 0;
    while i + 1 < tiles.len() {
        if let Some(merged) = merged_value(tiles[i], tiles[i + 1]) {
            tiles[i] = merged;
            gained += Score::from(merged);
            tiles[i + 1] = 0;
            i += 2;
        } else {
            i += 1;
        }
    }
    let mut out = [0; SIZE];
    for (slot, tile) in out.iter_mut().zip(tiles.into_iter().filter(|&t| t != 0)) {
        *slot = tile;
    }
    (out, gained)
}

/// Value of `a` merged with `b`, if the two tiles can merge.
#[inline]
fn merged_value(a: Tile, b: Tile) -> Option<Tile> {
    if a != 0 && a == b { a.checked_mul(2) } else { None }
}

/// True if the board has an empty cell or two mergeable 4-neighbours.
pub fn can_move(board: &Board) -> bool {
    let g = &board.0;
    for r in 0..SIZE {
        for c in 0..SIZE {
            let tile = g[r][c];
            if tile == 0 {
                return true;
            }
            if c + 1 < SIZE && merged_value(tile, g[r][c + 1]).is_some() {
                return true;
            }
            if r + 1 < SIZE && merged_value(tile, g[r + 1][c]).is_some() {
                return true;
            }
        }
    }
    false
}

pub(crate) fn empty_cells(board: &Board) -> Vec<(usize, usize)> {
    let mut cells = Vec::with_capacity(SIZE * SIZE);
    for (r, line) in board.0.iter().enumerate() {
        for (c, &tile) in line.iter().enumerate() {
            if tile == 0 {
                cells.push((r, c));
            }
        }
    }
    cells
}

pub(crate) fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_bool(SPAWN_TWO_PROBABILITY) { 2 } else { 4 }
}

/// Pick a uniformly random empty cell and drop a new tile in it.
///
/// The cell is drawn before the value. Returns `None` on a full board.
pub(crate) fn spawn_random_tile<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) -> Option<Spawn> {
    let empty = empty_cells(board);
    if empty.is_empty() {
        return None;
    }
    let (row, col) = empty[rng.gen_range(0..empty.len())];
    let value = generate_random_tile(rng);
    board.0[row][col] = value;
    Some(Spawn { row, col, value })
}

pub(crate) fn format_val(val: Tile) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{x:^7}"),
    }
}
