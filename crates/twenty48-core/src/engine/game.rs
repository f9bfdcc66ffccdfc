use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::BoardError;
use super::ops;
use super::state::{Board, GridView, Move, Score, Spawn, Status, Tile, WINNING_TILE};

/// A single 2048 session: board, score, status and the random source used
/// for spawning tiles.
///
/// Games built from an explicit board start in [`Status::NotStarted`] and
/// keep that board for deterministic restarts. Games built without one start
/// in [`Status::Playing`] with two random tiles.
///
/// ```
/// use twenty48_core::engine::{Board, Game, Status};
/// let board: Board = "2 2 0 0/0 0 0 0/0 0 0 0/0 0 0 0".parse().unwrap();
/// let mut game = Game::from_board(board);
/// assert_eq!(game.status(), Status::NotStarted);
/// game.start();
/// assert!(game.move_left());
/// assert_eq!(game.score(), 4);
/// assert_eq!(game.board().get(0, 0), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Game<R = StdRng> {
    board: Board,
    score: Score,
    status: Status,
    initial: Option<Board>,
    last_spawn: Option<Spawn>,
    moves: u64,
    rng: R,
}

impl Game<StdRng> {
    /// Random start, entropy-seeded.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Random start, reproducible from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Deterministic start from `board`; later spawns use an entropy-seeded RNG.
    pub fn from_board(board: Board) -> Self {
        Self::from_board_with_rng(board, StdRng::from_entropy())
    }

    /// Like [`Game::from_board`], validating a dynamically sized grid first.
    pub fn from_rows<L: AsRef<[Tile]>>(rows: &[L]) -> Result<Self, BoardError> {
        Ok(Self::from_board(Board::from_rows(rows)?))
    }
}

impl Default for Game<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Game<R> {
    /// Empty board with two random tiles, already `Playing`.
    pub fn with_rng(rng: R) -> Self {
        let mut game = Game {
            board: Board::EMPTY,
            score: 0,
            status: Status::Playing,
            initial: None,
            last_spawn: None,
            moves: 0,
            rng,
        };
        game.seed_random_board();
        game
    }

    /// Exactly `board`, no random tiles, `NotStarted` until [`Game::start`].
    pub fn from_board_with_rng(board: Board, rng: R) -> Self {
        Game {
            board,
            score: 0,
            status: Status::NotStarted,
            initial: Some(board),
            last_spawn: None,
            moves: 0,
            rng,
        }
    }

    /// Move a `NotStarted` game to `Playing`. No-op in any other status.
    pub fn start(&mut self) {
        if self.status == Status::NotStarted {
            self.set_status(Status::Playing);
        }
    }

    /// Reset the score and board.
    ///
    /// A game built from an explicit board gets that board back and returns
    /// to `NotStarted`; otherwise a fresh random board is dealt and play
    /// resumes immediately.
    pub fn restart(&mut self) {
        self.score = 0;
        self.moves = 0;
        self.last_spawn = None;
        match self.initial {
            Some(initial) => {
                self.board = initial;
                self.set_status(Status::NotStarted);
            }
            None => {
                self.seed_random_board();
                self.set_status(Status::Playing);
            }
        }
        info!("game restarted ({})", self.status);
    }

    pub fn move_left(&mut self) -> bool {
        self.apply(Move::Left)
    }

    pub fn move_right(&mut self) -> bool {
        self.apply(Move::Right)
    }

    pub fn move_up(&mut self) -> bool {
        self.apply(Move::Up)
    }

    pub fn move_down(&mut self) -> bool {
        self.apply(Move::Down)
    }

    /// Slide the board in `direction`. Returns true iff the board changed.
    ///
    /// A changing move adds its merge gains to the score, spawns exactly one
    /// tile and re-evaluates the status. A move that changes nothing leaves
    /// the game untouched, except that a board with no legal move at all is
    /// marked `Lost`. Finished games (`Won`/`Lost`) ignore moves.
    pub fn apply(&mut self, direction: Move) -> bool {
        if self.status.is_over() {
            return false;
        }
        let shifted = self.board.shift(direction);
        if !shifted.changed {
            if !self.board.can_move() {
                self.set_status(Status::Lost);
            }
            return false;
        }
        self.board = shifted.board;
        self.score += shifted.gained;
        self.moves += 1;
        debug!(
            "move {} #{}: +{} (score {})",
            direction, self.moves, shifted.gained, self.score
        );
        self.spawn_random_tile();
        self.refresh_status();
        true
    }

    /// Per-cell snapshot for rendering. Independent of the live board.
    pub fn state(&self) -> GridView {
        self.board.view()
    }

    /// Copy of the live board.
    #[inline]
    pub fn board(&self) -> Board {
        self.board
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    /// The board this game was built from, if any.
    #[inline]
    pub fn initial_board(&self) -> Option<Board> {
        self.initial
    }

    /// Where the most recent random tile landed.
    #[inline]
    pub fn last_spawn(&self) -> Option<Spawn> {
        self.last_spawn
    }

    /// Board-changing moves since construction or the last restart.
    #[inline]
    pub fn moves(&self) -> u64 {
        self.moves
    }

    #[inline]
    pub fn highest_tile(&self) -> Tile {
        self.board.highest_tile()
    }

    /// True if an empty cell or an equal 4-neighbour pair exists.
    #[inline]
    pub fn can_move(&self) -> bool {
        self.board.can_move()
    }

    /// Which directions would change the board, indexed by [`Move::index`].
    pub fn legal_moves(&self) -> [bool; 4] {
        Move::ALL.map(|dir| self.board.shift(dir).changed)
    }

    fn spawn_random_tile(&mut self) {
        let spawn = ops::spawn_random_tile(&mut self.board, &mut self.rng);
        if let Some(s) = spawn {
            trace!("spawned {} at ({}, {})", s.value, s.row, s.col);
        }
        self.last_spawn = spawn;
    }

    fn seed_random_board(&mut self) {
        self.board = Board::EMPTY;
        self.spawn_random_tile();
        self.spawn_random_tile();
    }

    fn refresh_status(&mut self) {
        let next = if self.board.contains(WINNING_TILE) {
            Status::Won
        } else if !self.board.can_move() {
            Status::Lost
        } else {
            Status::Playing
        };
        self.set_status(next);
    }

    fn set_status(&mut self, next: Status) {
        if next != self.status {
            info!(
                "status {} -> {} (score {}, highest tile {})",
                self.status,
                next,
                self.score,
                self.board.highest_tile()
            );
            self.status = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::Grid;
    use rand::rngs::mock::StepRng;

    const CHECKER: Grid = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];

    /// Spawns always land in the first empty cell (row-major) as a 2.
    fn fixed(grid: Grid) -> Game<StepRng> {
        Game::from_board_with_rng(Board::from_grid(grid).unwrap(), StepRng::new(0, 0))
    }

    #[test]
    fn merge_pair_scores_and_spawns() {
        let mut game = fixed([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        game.start();
        assert!(game.move_left());
        assert_eq!(game.score(), 4);
        assert_eq!(game.board().grid()[0], [4, 2, 0, 0]);
        assert_eq!(
            game.last_spawn(),
            Some(Spawn {
                row: 0,
                col: 1,
                value: 2
            })
        );
        assert_eq!(game.board().count_empty(), 14);
        assert_eq!(game.status(), Status::Playing);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn stuck_board_is_lost_and_rejects_moves() {
        let mut game = fixed(CHECKER);
        game.start();
        assert!(!game.move_left());
        assert_eq!(game.status(), Status::Lost);
        for dir in Move::ALL {
            assert!(!game.apply(dir));
        }
        assert_eq!(game.board(), Board::from_grid(CHECKER).unwrap());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn stuck_board_is_lost_even_before_start() {
        let mut game = fixed(CHECKER);
        assert!(!game.move_up());
        assert_eq!(game.status(), Status::Lost);
    }

    #[test]
    fn merging_to_2048_wins() {
        let mut game = fixed([[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]);
        game.start();
        assert!(game.move_left());
        assert_eq!(game.board().get(0, 0), 2048);
        assert_eq!(game.score(), 2048);
        assert_eq!(game.status(), Status::Won);

        let frozen = game.board();
        assert!(!game.move_right());
        assert_eq!(game.board(), frozen);
        assert_eq!(game.status(), Status::Won);
    }

    #[test]
    fn largest_tiles_never_overflow() {
        let top: Tile = 1 << 31;
        let mut game = fixed([[top, top, 0, 0], [0; 4], [0; 4], [0; 4]]);
        game.start();
        assert!(!game.move_left());
        assert_eq!(game.board().grid()[0], [top, top, 0, 0]);
        assert_eq!(game.score(), 0);
        assert_eq!(game.status(), Status::Playing);
        // sliding still works, merging does not
        assert_eq!(game.legal_moves(), [false, true, false, true]);
        assert!(game.move_right());
        assert_eq!(game.board().grid()[0], [2, 0, top, top]);
        assert_eq!(game.score(), 0);

        let mut game = fixed([[1 << 30, 1 << 30, 0, 0], [0; 4], [0; 4], [0; 4]]);
        game.start();
        assert!(game.move_left());
        assert_eq!(game.board().get(0, 0), top);
        assert_eq!(game.score(), 1 << 31);
    }

    #[test]
    fn largest_pair_on_full_board_is_lost() {
        let top: Tile = 1 << 31;
        let mut game = fixed([[top, top, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        game.start();
        assert!(!game.move_left());
        assert_eq!(game.status(), Status::Lost);
    }

    #[test]
    fn random_start_has_two_small_tiles() {
        for seed in 0..32 {
            let game = Game::seeded(seed);
            let tiles: Vec<Tile> = game.board().tiles().filter(|&t| t != 0).collect();
            assert_eq!(tiles.len(), 2, "seed {seed}");
            assert!(tiles.iter().all(|&t| t == 2 || t == 4));
            assert_eq!(game.status(), Status::Playing);
            assert_eq!(game.score(), 0);
            assert_eq!(game.initial_board(), None);
        }
    }

    #[test]
    fn random_start_with_zero_rng_fills_first_cells() {
        let game = Game::with_rng(StepRng::new(0, 0));
        assert_eq!(game.board().grid()[0], [2, 2, 0, 0]);
    }

    #[test]
    fn explicit_board_waits_for_start() {
        let grid = [[2, 0, 0, 0], [0, 4, 0, 0], [0; 4], [0, 0, 0, 8]];
        let mut game = fixed(grid);
        assert_eq!(game.status(), Status::NotStarted);
        assert_eq!(game.board().grid(), grid);
        game.start();
        assert_eq!(game.status(), Status::Playing);
        assert_eq!(game.board().grid(), grid);
        // idempotent
        game.start();
        assert_eq!(game.status(), Status::Playing);
    }

    #[test]
    fn changing_move_promotes_not_started_to_playing() {
        let mut game = fixed([[0, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(game.move_left());
        assert_eq!(game.status(), Status::Playing);
    }

    #[test]
    fn noop_move_changes_nothing() {
        let mut game = fixed([[2, 4, 0, 0], [8, 0, 0, 0], [0; 4], [0; 4]]);
        let before = game.board();
        assert!(!game.move_left());
        assert!(!game.move_up());
        assert_eq!(game.board(), before);
        assert_eq!(game.score(), 0);
        assert_eq!(game.status(), Status::NotStarted);
        assert_eq!(game.last_spawn(), None);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn filling_last_cell_without_pairs_loses() {
        let mut game = fixed([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [0, 8, 16, 32]]);
        game.start();
        assert!(game.move_left());
        assert_eq!(game.board().grid()[3], [8, 16, 32, 2]);
        assert_eq!(game.status(), Status::Lost);
    }

    #[test]
    fn restart_restores_initial_board() {
        let grid = [[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]];
        let mut game = fixed(grid);
        game.start();
        assert!(game.move_left());
        game.restart();
        assert_eq!(game.board().grid(), grid);
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves(), 0);
        assert_eq!(game.status(), Status::NotStarted);
    }

    #[test]
    fn restart_after_loss_deals_fresh_board() {
        let mut game = Game::seeded(99);
        let mut dirs = Move::ALL.iter().cycle();
        while !game.status().is_over() {
            game.apply(*dirs.next().unwrap());
        }
        assert!(game.moves() > 0);
        game.restart();
        assert_eq!(game.status(), Status::Playing);
        assert_eq!(game.score(), 0);
        assert_eq!(game.board().count_empty(), 14);
    }

    #[test]
    fn state_is_an_independent_copy() {
        let mut game = fixed([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut view = game.state();
        view[0][0].value = 4096;
        view[0][0].display_tag.clear();
        let mut board = game.board();
        board.0[1][1] = 64;
        assert_eq!(game.board().get(0, 0), 2);
        assert_eq!(game.board().get(1, 1), 0);
        assert_eq!(game.state()[0][0].display_tag, "field-cell--2");
        game.start();
        assert!(game.move_left());
        assert_eq!(game.board().get(0, 0), 4);
        assert_eq!(view[0][0].value, 4096);
    }

    #[test]
    fn moves_conserve_tile_mass_and_score() {
        let mut game = Game::seeded(2024);
        let mut dirs = [Move::Left, Move::Down, Move::Right, Move::Up].into_iter().cycle();
        for _ in 0..500 {
            if game.status().is_over() {
                break;
            }
            let before_sum = game.board().sum();
            let before_score = game.score();
            let dir = dirs.next().unwrap();
            let expected_gain = game.board().shift(dir).gained;
            if game.apply(dir) {
                let spawned = game.last_spawn().expect("changing move spawns");
                assert_eq!(game.board().sum(), before_sum + u64::from(spawned.value));
                assert_eq!(game.score(), before_score + expected_gain);
            } else {
                assert_eq!(game.board().sum(), before_sum);
                assert_eq!(game.score(), before_score);
            }
            assert!(game.score() >= before_score);
        }
    }

    #[test]
    fn second_failing_move_is_idempotent() {
        let mut game = Game::seeded(5);
        for dir in Move::ALL {
            game.apply(dir);
            let board = game.board();
            let score = game.score();
            let status = game.status();
            if !game.apply(dir) {
                assert_eq!(game.board(), board);
                assert_eq!(game.score(), score);
                assert_eq!(game.status(), status);
            }
        }
    }

    #[test]
    fn legal_moves_match_shift() {
        let game = fixed([[2, 4, 0, 0], [8, 0, 0, 0], [0; 4], [0; 4]]);
        // Up, Down, Left, Right
        assert_eq!(game.legal_moves(), [false, true, false, true]);
    }

    #[test]
    fn from_rows_validates() {
        let bad: Vec<Vec<Tile>> = vec![vec![2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        assert_eq!(
            Game::from_rows(&bad).unwrap_err(),
            BoardError::RowLength { row: 0, len: 3 }
        );
        let ok: Vec<Vec<Tile>> = vec![vec![2, 0, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        let game = Game::from_rows(&ok).unwrap();
        assert_eq!(game.status(), Status::NotStarted);
        assert_eq!(game.initial_board(), Some(game.board()));
    }

    #[test]
    fn state_serializes_for_presentation() {
        let game = fixed([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let json = serde_json::to_value(game.state()).unwrap();
        assert_eq!(json[0][0]["value"], 2);
        assert_eq!(json[0][0]["display_tag"], "field-cell--2");
        assert_eq!(json[0][1]["display_tag"], "");
    }
}
