use serde::{Deserialize, Serialize};

use crate::{
    board::{Cell, Projection},
    error::GameError,
    grid::{Grid, Symbol},
    point::{Dimensions, Point},
};

/// What the player knows, or has deduced, about a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Belief {
    Unknown,
    /// Proven safe, not revealed yet.
    Safe,
    /// Deduced (or, after a loss, shown) to be a mine.
    Mine,
    Count(u8),
}

impl Belief {
    pub fn is_revealed(self) -> bool {
        matches!(self, Belief::Count(_))
    }
}

impl Symbol for Belief {
    fn symbol(&self) -> char {
        match self {
            Belief::Unknown => '@',
            Belief::Safe => '+',
            Belief::Mine => '*',
            Belief::Count(0) => '-',
            Belief::Count(n) => char::from(b'0' + n),
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Belief::Safe),
            _ => Cell::from_symbol(symbol).map(|cell| match cell {
                Cell::Hidden => Belief::Unknown,
                Cell::Mine => Belief::Mine,
                Cell::Revealed(n) => Belief::Count(n),
            }),
        }
    }
}

/// The solver's private copy of the board.
///
/// Everything the board engine reveals is mirrored exactly; on top of that the
/// solver records its own `Safe` and `Mine` deductions for hidden cells. Grows
/// by accretion only: a deduced mine is never reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefBoard {
    grid: Grid<Belief>,
}

impl BeliefBoard {
    pub fn new(rows: usize, cols: usize) -> Self {
        BeliefBoard {
            grid: Grid::filled(Dimensions { rows, cols }, Belief::Unknown),
        }
    }

    pub fn from_grid(grid: Grid<Belief>) -> Self {
        BeliefBoard { grid }
    }

    pub fn parse(text: &str) -> Result<Self, crate::grid::ParseGridError> {
        Grid::parse(text).map(Self::from_grid)
    }

    pub fn dims(&self) -> Dimensions {
        self.grid.dims()
    }

    pub fn grid(&self) -> &Grid<Belief> {
        &self.grid
    }

    pub fn get(&self, point: Point) -> Option<Belief> {
        self.grid.get(point).copied()
    }

    /// Merges an authoritative projection into the beliefs.
    ///
    /// Revealed values overwrite everything except a deduced mine. Hidden cells
    /// keep whatever the solver has deduced about them, and a revealed mine
    /// confirms a `Mine` belief.
    pub fn observe(&mut self, projection: &Projection) -> Result<(), GameError> {
        if projection.dims() != self.dims() {
            return Err(GameError::DimensionMismatch {
                expected: self.dims(),
                actual: projection.dims(),
            });
        }

        for (point, cell) in projection.iter() {
            let belief = &mut self.grid[point];
            match *cell {
                Cell::Revealed(n) if *belief == Belief::Mine => {
                    // Mine deductions are never reverted; a sound pipeline never gets here.
                    log::warn!("{point} was deduced to be a mine but revealed {n}");
                }
                Cell::Revealed(n) => *belief = Belief::Count(n),
                Cell::Mine => {
                    if *belief == Belief::Safe {
                        log::warn!("{point} was deduced safe but is a mine");
                    }
                    *belief = Belief::Mine;
                }
                Cell::Hidden => {}
            }
        }
        Ok(())
    }

    /// Records a safe deduction. Returns whether the cell was previously unknown.
    pub fn mark_safe(&mut self, point: Point) -> bool {
        self.mark(point, Belief::Safe)
    }

    /// Records a mine deduction. Returns whether the cell was previously unknown.
    pub fn mark_mine(&mut self, point: Point) -> bool {
        self.mark(point, Belief::Mine)
    }

    fn mark(&mut self, point: Point, belief: Belief) -> bool {
        match self.grid.get(point) {
            Some(Belief::Unknown) => {
                self.grid[point] = belief;
                true
            }
            _ => false,
        }
    }

    pub fn unknown(&self) -> impl Iterator<Item = Point> {
        self.points_where(Belief::Unknown)
    }

    pub fn deduced_mines(&self) -> impl Iterator<Item = Point> {
        self.points_where(Belief::Mine)
    }

    fn points_where(&self, wanted: Belief) -> impl Iterator<Item = Point> {
        self.grid
            .iter()
            .filter(move |(_, belief)| **belief == wanted)
            .map(|(point, _)| point)
    }

    pub fn count_unknown(&self) -> usize {
        self.unknown().count()
    }

    /// A revealed count with at least one unknown neighbour.
    pub fn is_fringe(&self, point: Point) -> bool {
        matches!(self.get(point), Some(Belief::Count(_)))
            && self
                .grid
                .neighbors(point)
                .any(|(_, belief)| *belief == Belief::Unknown)
    }
}

impl std::fmt::Display for BeliefBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.grid, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: usize, y: usize) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_first_observation_copies_projection() {
        let projection = Projection::parse("@ 1 -\n@ 2 -\n@ @ 1").unwrap();
        let mut belief = BeliefBoard::new(3, 3);
        belief.observe(&projection).unwrap();
        assert_eq!(belief.to_string(), projection.to_string());
    }

    #[test]
    fn test_deduced_mine_survives_observation() {
        let mut belief = BeliefBoard::new(2, 2);
        assert!(belief.mark_mine(p(0, 0)));
        assert!(belief.mark_safe(p(1, 1)));
        assert!(!belief.mark_safe(p(0, 0)));

        let projection = Projection::parse("@ 1\n1 @").unwrap();
        belief.observe(&projection).unwrap();
        assert_eq!(belief.get(p(0, 0)), Some(Belief::Mine));
        assert_eq!(belief.get(p(1, 1)), Some(Belief::Safe));
        assert_eq!(belief.get(p(1, 0)), Some(Belief::Count(1)));

        // Revealing the safe cell replaces the private marking.
        let projection = Projection::parse("@ 1\n1 1").unwrap();
        belief.observe(&projection).unwrap();
        assert_eq!(belief.get(p(1, 1)), Some(Belief::Count(1)));
        assert_eq!(belief.deduced_mines().collect::<Vec<_>>(), vec![p(0, 0)]);
    }

    #[test]
    fn test_mine_marking_is_monotonic() {
        let mut belief = BeliefBoard::new(1, 2);
        belief.mark_mine(p(0, 0));
        belief.observe(&Projection::parse("1 @").unwrap()).unwrap();
        assert_eq!(belief.get(p(0, 0)), Some(Belief::Mine));
    }

    #[test]
    fn test_revealed_mine_is_recorded() {
        let mut belief = BeliefBoard::new(1, 2);
        belief.observe(&Projection::parse("* 1").unwrap()).unwrap();
        assert_eq!(belief.get(p(0, 0)), Some(Belief::Mine));
        assert_eq!(belief.count_unknown(), 0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut belief = BeliefBoard::new(2, 2);
        let err = belief
            .observe(&Projection::parse("@ @ @").unwrap())
            .unwrap_err();
        assert!(matches!(err, GameError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_fringe() {
        let belief = BeliefBoard::parse("1 @\n- +").unwrap();
        assert!(belief.is_fringe(p(0, 0)));
        assert!(!belief.is_fringe(p(1, 1)));
        assert!(!belief.is_fringe(p(1, 0)));
    }
}
