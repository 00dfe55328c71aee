use std::collections::{HashSet, VecDeque};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    config::GameConfig,
    error::GameError,
    grid::{Grid, Symbol},
    point::{Dimensions, Point},
};

/// Ground truth for a single position. Fixed once the board is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Mine,
    Count(u8), // Number of adjacent mines.
}

/// The player-visible state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Hidden,
    Revealed(u8), // The u8 is the number of adjacent mines.
    Mine,         // Only shown once the game is lost.
}

impl Symbol for Cell {
    fn symbol(&self) -> char {
        match self {
            Cell::Hidden => '@',
            Cell::Mine => '*',
            Cell::Revealed(0) => '-',
            Cell::Revealed(n) => char::from(b'0' + n),
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '@' => Some(Cell::Hidden),
            '*' => Some(Cell::Mine),
            '-' | '0' => Some(Cell::Revealed(0)),
            '1'..='8' => Some(Cell::Revealed(symbol as u8 - b'0')),
            _ => None,
        }
    }
}

/// The player-visible board as handed to observers.
pub type Projection = Grid<Cell>;

/// Result of a successfully applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Continue,
    Win,
    Loss,
}

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// The board engine: owns the mine layout and the projection shown to players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    mines: usize,
    ground_truth: Grid<Tile>,
    visible: Projection,
    /// Hidden non-mine cells. The game is won when this reaches zero.
    remaining_safe: usize,
    state: GameState,
}

impl Board {
    /// Generates a board, placing `config.mines` mines uniformly at random without replacement.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let dims = Dimensions {
            rows: config.rows,
            cols: config.cols,
        };

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut is_mine = Grid::filled(dims, false);
        for index in rand::seq::index::sample(&mut rng, dims.area(), config.mines) {
            is_mine[dims.point(index)] = true;
        }

        log::debug!(
            "generated {}x{} board with {} mines (seed {:?})",
            dims.rows,
            dims.cols,
            config.mines,
            config.seed
        );
        Ok(Self::from_layout(is_mine))
    }

    /// Builds a board with mines at exactly the given points. Duplicates are ignored.
    pub fn from_mines(rows: usize, cols: usize, mines: &[Point]) -> Result<Self, GameError> {
        let dims = Dimensions { rows, cols };
        if let Some(&outside) = mines.iter().find(|p| !dims.contains(**p)) {
            return Err(GameError::out_of_bounds(outside));
        }

        let unique: HashSet<Point> = mines.iter().copied().collect();
        GameConfig::new(rows, cols, unique.len()).validate()?;

        let is_mine = Grid::from_fn(dims, |p| unique.contains(&p));
        Ok(Self::from_layout(is_mine))
    }

    /// Builds a board from a layout drawn with `*` for mines and any other
    /// board symbol for safe cells.
    pub fn from_layout_str(text: &str) -> anyhow::Result<Self> {
        let layout = Projection::parse(text)?;
        let mines: Vec<Point> = layout
            .iter()
            .filter(|(_, cell)| **cell == Cell::Mine)
            .map(|(p, _)| p)
            .collect();
        Ok(Self::from_mines(layout.rows(), layout.cols(), &mines)?)
    }

    fn from_layout(is_mine: Grid<bool>) -> Self {
        let dims = is_mine.dims();
        let ground_truth = Grid::from_fn(dims, |p| {
            if is_mine[p] {
                Tile::Mine
            } else {
                Tile::Count(is_mine.neighbors(p).filter(|(_, mine)| **mine).count() as u8)
            }
        });
        let mines = is_mine.values().filter(|mine| **mine).count();
        let remaining_safe = dims.area() - mines;

        Board {
            mines,
            ground_truth,
            visible: Grid::filled(dims, Cell::Hidden),
            remaining_safe,
            // Degenerate but legal: nothing left to reveal.
            state: if remaining_safe == 0 {
                GameState::Won
            } else {
                GameState::Playing
            },
        }
    }

    /// Rows and columns of the board.
    pub fn dims(&self) -> Dimensions {
        self.visible.dims()
    }

    /// Board height.
    pub fn rows(&self) -> usize {
        self.visible.rows()
    }

    /// Board width.
    pub fn cols(&self) -> usize {
        self.visible.cols()
    }

    /// Total number of mines on the board, revealed or not.
    pub fn mine_count(&self) -> usize {
        self.mines
    }

    /// Non-mine cells still hidden. Zero exactly when the game is won.
    pub fn remaining_safe(&self) -> usize {
        self.remaining_safe
    }

    /// Whether the game is still running, won or lost.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// True once the game is won or lost. Every further move is rejected.
    pub fn is_ended(&self) -> bool {
        self.state != GameState::Playing
    }

    /// What a player currently sees at `point`.
    pub fn cell(&self, point: Point) -> Option<Cell> {
        self.visible.get(point).copied()
    }

    /// Ground truth for a position. Not part of what a player may look at.
    pub fn tile(&self, point: Point) -> Option<Tile> {
        self.ground_truth.get(point).copied()
    }

    /// Ground truth check. Out-of-bounds points are not mines.
    pub fn is_mine(&self, point: Point) -> bool {
        self.tile(point) == Some(Tile::Mine)
    }

    /// A snapshot of the player-visible grid. Mutating it does not affect the board.
    pub fn visible(&self) -> Projection {
        self.visible.clone()
    }

    /// Borrowing counterpart of [`Board::visible`] for callers that only read.
    pub fn projection(&self) -> &Projection {
        &self.visible
    }

    /// Reveals the cell at `at`.
    ///
    /// Revealing a mine discloses every mine and ends the game with a loss. A
    /// zero count cascades over the connected zero region and its border. The
    /// game is won once every non-mine cell has been revealed.
    pub fn apply_move(&mut self, at: Point) -> Result<MoveOutcome, GameError> {
        let cell = self.cell(at).ok_or(GameError::out_of_bounds(at))?;
        if self.is_ended() {
            return Err(GameError::GameEnded);
        }
        if cell != Cell::Hidden {
            return Err(GameError::AlreadyRevealed { x: at.x, y: at.y });
        }

        match self.ground_truth[at] {
            Tile::Mine => {
                self.reveal_mines();
                self.state = GameState::Lost;
                log::info!("mine hit at {at}");
                return Ok(MoveOutcome::Loss);
            }
            Tile::Count(0) => {
                let revealed = self.flood_fill_reveal(at);
                log::trace!("flood fill from {at} revealed {} cells", revealed.len());
            }
            Tile::Count(n) => {
                self.visible[at] = Cell::Revealed(n);
                self.remaining_safe -= 1;
            }
        }

        if self.remaining_safe == 0 {
            self.state = GameState::Won;
            log::info!("all safe cells revealed");
            return Ok(MoveOutcome::Win);
        }
        Ok(MoveOutcome::Continue)
    }

    fn reveal_mines(&mut self) {
        for (point, tile) in self.ground_truth.iter() {
            if *tile == Tile::Mine {
                self.visible[point] = Cell::Mine;
            }
        }
    }

    /// Reveals the zero-count region containing `start_point` plus its numbered border.
    ///
    /// Each cell is queued at most once, so this terminates on any finite grid.
    fn flood_fill_reveal(&mut self, start_point: Point) -> Vec<Point> {
        let mut revealed_points = Vec::new();
        let mut queue = VecDeque::from([start_point]);
        let mut visited = HashSet::from([start_point]);

        while let Some(point) = queue.pop_front() {
            if self.visible[point] != Cell::Hidden {
                continue;
            }
            let Tile::Count(mine_count) = self.ground_truth[point] else {
                continue;
            };

            self.visible[point] = Cell::Revealed(mine_count);
            self.remaining_safe -= 1;
            revealed_points.push(point);

            if mine_count == 0 {
                for neighbor in self.dims().neighbors(point) {
                    if self.visible[neighbor] == Cell::Hidden && visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        revealed_points
    }

    /// Deserializes a game state from bytes, rejecting states whose grids or
    /// counters do not agree with each other.
    pub fn from_bytes(bts: &[u8]) -> anyhow::Result<Self> {
        let board: Board = bcs::from_bytes(bts)?;
        board.check_consistency()?;
        Ok(board)
    }

    fn check_consistency(&self) -> anyhow::Result<()> {
        if !self.ground_truth.is_well_formed() || !self.visible.is_well_formed() {
            anyhow::bail!("grid storage does not match its dimensions");
        }
        if self.ground_truth.dims() != self.visible.dims() {
            anyhow::bail!("ground truth and projection differ in size");
        }
        let mines = self.ground_truth.values().filter(|t| **t == Tile::Mine).count();
        let hidden_safe = self
            .ground_truth
            .iter()
            .filter(|&(p, tile)| *tile != Tile::Mine && self.visible[p] == Cell::Hidden)
            .count();
        if mines != self.mines || hidden_safe != self.remaining_safe {
            anyhow::bail!("mine or safe-cell counters do not match the grids");
        }
        Ok(())
    }

    /// Serializes the game state to bytes.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.visible, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: usize, y: usize) -> Point {
        Point::new(x, y)
    }

    /// Brute-force reference for the adjacency counts.
    fn reference_count(board: &Board, at: Point) -> u8 {
        let mut count = 0;
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let (nx, ny) = (at.x as isize + dx, at.y as isize + dy);
                if (dx, dy) != (0, 0)
                    && nx >= 0
                    && ny >= 0
                    && board.is_mine(p(nx as usize, ny as usize))
                {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_board_initialization() {
        let board = Board::new(GameConfig::new(5, 4, 3).with_seed(7)).unwrap();
        assert_eq!(board.rows(), 5);
        assert_eq!(board.cols(), 4);
        assert_eq!(board.mine_count(), 3);
        assert_eq!(board.remaining_safe(), 17);
        assert_eq!(board.state(), GameState::Playing);
        assert!(board.projection().values().all(|c| *c == Cell::Hidden));
    }

    #[test]
    fn test_too_many_mines() {
        assert!(matches!(
            Board::new(GameConfig::new(3, 3, 9)),
            Err(GameError::InvalidConfiguration { mines: 9, .. })
        ));
        assert!(matches!(
            Board::from_mines(1, 2, &[p(0, 0), p(1, 0)]),
            Err(GameError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let config = GameConfig::beginner().with_seed(42);
        let a = Board::new(config).unwrap();
        let b = Board::new(config).unwrap();
        let mines_a: Vec<_> = a.dims().points().filter(|&q| a.is_mine(q)).collect();
        let mines_b: Vec<_> = b.dims().points().filter(|&q| b.is_mine(q)).collect();
        assert_eq!(mines_a, mines_b);
    }

    #[test]
    fn test_corner_mine_is_never_flooded() {
        // Single mine at (0,0): the opposite corner has count 0 and floods
        // everything except the mine.
        let mut board = Board::from_mines(3, 3, &[p(0, 0)]).unwrap();
        assert_eq!(board.tile(p(2, 2)), Some(Tile::Count(0)));

        let outcome = board.apply_move(p(2, 2)).unwrap();
        assert_eq!(outcome, MoveOutcome::Win);
        assert_eq!(board.cell(p(0, 0)), Some(Cell::Hidden));
        assert_eq!(board.cell(p(1, 1)), Some(Cell::Revealed(1)));
        assert_eq!(board.remaining_safe(), 0);
    }

    #[test]
    fn test_numbered_cell_reveals_only_itself() {
        let mut board = Board::from_layout_str(
            "
            * - - -
            - - - -
            - - - *
            ",
        )
        .unwrap();
        assert_eq!(board.apply_move(p(1, 1)).unwrap(), MoveOutcome::Continue);
        let revealed = board
            .projection()
            .values()
            .filter(|c| **c != Cell::Hidden)
            .count();
        assert_eq!(revealed, 1);
        assert_eq!(board.cell(p(1, 1)), Some(Cell::Revealed(1)));
    }

    #[test]
    fn test_hitting_mine() {
        let mut board = Board::from_mines(3, 3, &[p(0, 0), p(2, 1)]).unwrap();
        assert_eq!(board.apply_move(p(2, 1)).unwrap(), MoveOutcome::Loss);
        assert_eq!(board.state(), GameState::Lost);
        assert_eq!(board.cell(p(0, 0)), Some(Cell::Mine));
        assert_eq!(board.cell(p(2, 1)), Some(Cell::Mine));

        let before = board.visible();
        assert_eq!(board.apply_move(p(1, 1)), Err(GameError::GameEnded));
        assert_eq!(board.visible(), before);
    }

    #[test]
    fn test_move_errors() {
        let mut board = Board::from_mines(3, 3, &[p(0, 0)]).unwrap();
        assert_eq!(
            board.apply_move(p(3, 0)),
            Err(GameError::OutOfBounds { x: 3, y: 0 })
        );
        board.apply_move(p(1, 0)).unwrap();
        let err = board.apply_move(p(1, 0)).unwrap_err();
        assert_eq!(err, GameError::AlreadyRevealed { x: 1, y: 0 });
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_symbols_round_trip() {
        let text = "@ * -\n1 8 @\n";
        let grid = Projection::parse(text).unwrap();
        assert_eq!(grid[p(0, 1)], Cell::Revealed(1));
        assert_eq!(grid[p(2, 0)], Cell::Revealed(0));
        assert_eq!(grid.to_string(), text);
        assert!(Projection::parse("@ ?").is_err());
        assert!(Projection::parse("@ @\n@").is_err());
    }

    #[test]
    fn test_serialization() {
        let mut board = Board::new(GameConfig::beginner().with_seed(3)).unwrap();
        let safe = board.dims().points().find(|&q| !board.is_mine(q)).unwrap();
        board.apply_move(safe).unwrap();

        let restored = Board::from_bytes(&board.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.visible(), board.visible());
        assert_eq!(restored.remaining_safe(), board.remaining_safe());
        assert_eq!(restored.state(), board.state());
    }

    #[test]
    fn test_malformed_bytes_are_rejected() {
        // bcs lays a struct out like the tuple of its fields.
        let dims = Dimensions { rows: 2, cols: 2 };
        let truth = vec![Tile::Mine, Tile::Count(1), Tile::Count(1), Tile::Count(1)];
        let encode = |truth: &[Tile], visible: &[Cell], remaining_safe: usize| {
            let state = (
                1usize,
                (dims, truth.to_vec()),
                (dims, visible.to_vec()),
                remaining_safe,
                GameState::Playing,
            );
            bcs::to_bytes(&state).unwrap()
        };

        let hidden = [Cell::Hidden; 4];
        let board = Board::from_bytes(&encode(&truth, &hidden, 3)).unwrap();
        assert_eq!(board.tile(p(1, 1)), Some(Tile::Count(1)));

        // Too few cells for the dimensions.
        assert!(Board::from_bytes(&encode(&truth[..2], &hidden, 3)).is_err());
        assert!(Board::from_bytes(&encode(&truth, &hidden[..3], 3)).is_err());
        // Counter out of step with the grids.
        assert!(Board::from_bytes(&encode(&truth, &hidden, 2)).is_err());

        let mut board = Board::from_mines(2, 2, &[p(0, 0)]).unwrap();
        board.visible = Grid::filled(Dimensions { rows: 1, cols: 4 }, Cell::Hidden);
        assert!(Board::from_bytes(&board.to_bytes().unwrap()).is_err());
    }

    proptest! {
        #[test]
        fn prop_counts_match_reference(
            rows in 1usize..9,
            cols in 1usize..9,
            density in 0.0f64..1.0,
            seed: u64,
        ) {
            let mines = ((rows * cols - 1) as f64 * density) as usize;
            let board = Board::new(GameConfig::new(rows, cols, mines).with_seed(seed)).unwrap();

            let placed = board.dims().points().filter(|&q| board.is_mine(q)).count();
            prop_assert_eq!(placed, mines);
            for q in board.dims().points() {
                if let Some(Tile::Count(n)) = board.tile(q) {
                    prop_assert_eq!(n, reference_count(&board, q));
                }
            }
        }

        #[test]
        fn prop_flood_fill_reveals_component(
            rows in 1usize..10,
            cols in 1usize..10,
            mines in 0usize..12,
            seed: u64,
            pick: usize,
        ) {
            prop_assume!(mines < rows * cols);
            let mut board = Board::new(GameConfig::new(rows, cols, mines).with_seed(seed)).unwrap();
            let safe: Vec<Point> = board.dims().points().filter(|&q| !board.is_mine(q)).collect();
            let start = safe[pick % safe.len()];

            // Reference component: zero cells reachable through zero cells, plus their border.
            let mut expected = HashSet::from([start]);
            let mut stack = vec![start];
            while let Some(q) = stack.pop() {
                if board.tile(q) == Some(Tile::Count(0)) {
                    for n in board.dims().neighbors(q) {
                        if expected.insert(n) {
                            stack.push(n);
                        }
                    }
                }
            }

            let before = board.remaining_safe();
            let outcome = board.apply_move(start).unwrap();
            let revealed: HashSet<Point> = board
                .projection()
                .iter()
                .filter(|(_, c)| matches!(c, Cell::Revealed(_)))
                .map(|(q, _)| q)
                .collect();

            prop_assert_eq!(&revealed, &expected);
            prop_assert_eq!(before - board.remaining_safe(), expected.len());
            prop_assert_eq!(outcome == MoveOutcome::Win, board.remaining_safe() == 0);
        }

        #[test]
        fn prop_win_iff_no_safe_cells_left(
            rows in 1usize..7,
            cols in 1usize..7,
            mines in 0usize..8,
            seed: u64,
        ) {
            prop_assume!(mines < rows * cols);
            let mut board = Board::new(GameConfig::new(rows, cols, mines).with_seed(seed)).unwrap();
            let points: Vec<Point> = board.dims().points().collect();
            for q in points {
                if board.is_mine(q) || board.cell(q) != Some(Cell::Hidden) {
                    continue;
                }
                let outcome = board.apply_move(q).unwrap();
                prop_assert_ne!(outcome, MoveOutcome::Loss);
                prop_assert_eq!(outcome == MoveOutcome::Win, board.remaining_safe() == 0);
            }
            prop_assert_eq!(board.state(), GameState::Won);
            prop_assert!(
                board
                    .projection()
                    .iter()
                    .all(|(q, c)| board.is_mine(q) == (*c == Cell::Hidden))
            );
        }
    }
}
