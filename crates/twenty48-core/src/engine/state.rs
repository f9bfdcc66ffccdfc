use rand::Rng;
use std::fmt;
use std::str::FromStr;

use super::error::BoardError;
use super::ops;
use serde::{Deserialize, Serialize};

/// Side length of the square board.
pub const SIZE: usize = 4;

/// Number of cells on the board.
pub const CELLS: usize = SIZE * SIZE;

/// Reaching this tile wins the game.
pub const WINNING_TILE: Tile = 2048;

/// A cell value: 0 for empty, otherwise a power of two.
pub type Tile = u32;
pub type Line = [Tile; SIZE];
pub type Grid = [Line; SIZE];
pub type Score = u64;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Every direction, in index order (Up=0, Down=1, Left=2, Right=3).
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a game.
///
/// `NotStarted` only exists for games built from a caller-supplied board.
/// `Won` and `Lost` are terminal until the game is restarted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    Playing,
    Won,
    Lost,
}

impl Status {
    /// True for `Won` and `Lost`.
    #[inline]
    pub fn is_over(self) -> bool {
        matches!(self, Status::Won | Status::Lost)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::NotStarted => "not started",
            Status::Playing => "playing",
            Status::Won => "won",
            Status::Lost => "lost",
        };
        f.write_str(name)
    }
}

/// Where a freshly spawned tile landed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Spawn {
    pub row: usize,
    pub col: usize,
    pub value: Tile,
}

/// Result of sliding a board without inserting a random tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shifted {
    pub board: Board,
    /// Sum of every tile produced by a merge.
    pub gained: Score,
    /// True if any line differs from its pre-move contents.
    pub changed: bool,
}

/// Read-only view of one cell, as handed to a presentation layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CellView {
    pub value: Tile,
    /// `field-cell--<value>`, or empty for an empty cell.
    pub display_tag: String,
}

impl CellView {
    pub fn new(value: Tile) -> Self {
        let display_tag = if value == 0 {
            String::new()
        } else {
            format!("field-cell--{value}")
        };
        Self { value, display_tag }
    }
}

pub type GridView = [[CellView; SIZE]; SIZE];

/// 4x4 2048 board stored row-major as plain tile values.
///
/// `Board` is `Copy`, so every accessor hands out an independent grid; no
/// caller can alias the engine's live state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Board(pub(crate) Grid);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board([[0; SIZE]; SIZE]);

    /// Build a board from a fixed-size grid, rejecting values that are
    /// neither 0 nor a power of two.
    ///
    /// ```
    /// use twenty48_core::engine::Board;
    /// let b = Board::from_grid([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// assert_eq!(b.get(0, 1), 2);
    /// assert!(Board::from_grid([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    /// ```
    pub fn from_grid(grid: Grid) -> Result<Self, BoardError> {
        for (row, line) in grid.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if !is_valid_tile(value) {
                    return Err(BoardError::InvalidTile { row, col, value });
                }
            }
        }
        Ok(Board(grid))
    }

    /// Build a board from dynamically sized rows, checking dimensions first.
    ///
    /// ```
    /// use twenty48_core::engine::{Board, BoardError};
    /// let rows: Vec<Vec<u32>> = vec![vec![2, 4, 0, 0], vec![0; 4], vec![0; 4]];
    /// assert_eq!(Board::from_rows(&rows), Err(BoardError::RowCount { rows: 3 }));
    /// ```
    pub fn from_rows<L: AsRef<[Tile]>>(rows: &[L]) -> Result<Self, BoardError> {
        if rows.len() != SIZE {
            return Err(BoardError::RowCount { rows: rows.len() });
        }
        let mut grid = [[0; SIZE]; SIZE];
        for (row, (dst, src)) in grid.iter_mut().zip(rows).enumerate() {
            let src = src.as_ref();
            if src.len() != SIZE {
                return Err(BoardError::RowLength { row, len: src.len() });
            }
            dst.copy_from_slice(src);
        }
        Board::from_grid(grid)
    }

    /// Copy of the underlying grid.
    #[inline]
    pub fn grid(&self) -> Grid {
        self.0
    }

    /// Value at (`row`, `col`); panics when out of range.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Tile {
        self.0[row][col]
    }

    /// Get the value at index, running 0..16 row-major.
    #[inline]
    pub fn tile_value(&self, idx: usize) -> Tile {
        self.0[idx / SIZE][idx % SIZE]
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// ```
    /// use twenty48_core::engine::{Board, Move};
    /// let b = Board::from_grid([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// let shifted = b.shift(Move::Left);
    /// assert_eq!(shifted.board.get(0, 0), 4);
    /// assert_eq!(shifted.gained, 4);
    /// assert!(shifted.changed);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Shifted {
        ops::shift(self, dir)
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// Deterministic example using a seeded RNG:
    /// ```
    /// use twenty48_core::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        ops::spawn_random_tile(&mut self, rng);
        self
    }

    /// True if some move would change the board.
    #[inline]
    pub fn can_move(&self) -> bool {
        ops::can_move(self)
    }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use twenty48_core::engine::Board;
    /// let stuck = Board::from_grid([
    ///     [2, 4, 2, 4],
    ///     [4, 2, 4, 2],
    ///     [2, 4, 2, 4],
    ///     [4, 2, 4, 2],
    /// ])
    /// .unwrap();
    /// assert!(stuck.is_game_over());
    /// assert!(!Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(&self) -> bool {
        !ops::can_move(self)
    }

    /// Return the highest tile value (e.g., 2048) present on the board.
    #[inline]
    pub fn highest_tile(&self) -> Tile {
        self.tiles().max().unwrap_or(0)
    }

    /// True if any cell holds exactly `value`.
    #[inline]
    pub fn contains(&self, value: Tile) -> bool {
        self.tiles().any(|t| t == value)
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(&self) -> usize {
        self.tiles().filter(|&t| t == 0).count()
    }

    /// Coordinates of every empty cell in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        ops::empty_cells(self)
    }

    /// Sum of every tile on the board.
    #[inline]
    pub fn sum(&self) -> u64 {
        self.tiles().map(u64::from).sum()
    }

    /// Iterate over tile values in row-major order.
    #[inline]
    pub fn tiles(&self) -> TilesIter {
        TilesIter {
            grid: self.0,
            idx: 0,
        }
    }

    /// Per-cell view with display tags.
    pub fn view(&self) -> GridView {
        std::array::from_fn(|row| std::array::from_fn(|col| CellView::new(self.0[row][col])))
    }
}

fn is_valid_tile(value: Tile) -> bool {
    value == 0 || (value >= 2 && value.is_power_of_two())
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "-".repeat(SIZE * 8 - 1);
        for (i, line) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f, "{separator}")?;
            }
            let cells: Vec<String> = line.iter().map(|&t| ops::format_val(t)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

/// Parses rows separated by `/` or newlines, cells separated by whitespace
/// or commas, e.g. `"2 2 0 0 / 0 0 0 0 / 0 0 0 0 / 0 0 0 4"`.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .split(['/', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|cell| !cell.is_empty())
                    .map(|cell| {
                        cell.parse::<Tile>()
                            .map_err(|e| BoardError::Parse(format!("'{cell}': {e}")))
                    })
                    .collect::<Result<Vec<Tile>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Board::from_rows(&rows)
    }
}

impl TryFrom<Grid> for Board {
    type Error = BoardError;
    fn try_from(grid: Grid) -> Result<Self, Self::Error> {
        Board::from_grid(grid)
    }
}

impl From<Board> for Grid {
    fn from(b: Board) -> Self {
        b.0
    }
}

/// Iterator over board tiles in row-major order.
pub struct TilesIter {
    grid: Grid,
    idx: usize,
}

impl Iterator for TilesIter {
    type Item = Tile;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= CELLS {
            return None;
        }
        let t = self.grid[self.idx / SIZE][self.idx % SIZE];
        self.idx += 1;
        Some(t)
    }
}

impl IntoIterator for Board {
    type Item = Tile;
    type IntoIter = TilesIter;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.tiles()
    }
}

impl IntoIterator for &Board {
    type Item = Tile;
    type IntoIter = TilesIter;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.tiles()
    }
}
