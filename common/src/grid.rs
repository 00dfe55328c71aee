use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::point::{Dimensions, Point};

/// An owned, row-major 2D array with one value per board position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    dims: Dimensions,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// A grid with every position set to `value`.
    pub fn filled(dims: Dimensions, value: T) -> Self {
        Grid {
            dims,
            cells: vec![value; dims.area()],
        }
    }
}

impl<T> Grid<T> {
    /// A grid whose value at each position is computed by `f`, in row-major order.
    pub fn from_fn(dims: Dimensions, mut f: impl FnMut(Point) -> T) -> Self {
        Grid {
            dims,
            cells: dims.points().map(&mut f).collect(),
        }
    }

    /// Rows and columns of the grid.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Number of rows (the height).
    pub fn rows(&self) -> usize {
        self.dims.rows
    }

    /// Number of columns (the width).
    pub fn cols(&self) -> usize {
        self.dims.cols
    }

    /// The value at `point`, or `None` if it lies outside the grid.
    pub fn get(&self, point: Point) -> Option<&T> {
        self.dims
            .contains(point)
            .then(|| &self.cells[self.dims.index(point)])
    }

    /// Iterates over every position together with its value, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> {
        let dims = self.dims;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, value)| (dims.point(i), value))
    }

    /// Whether the cell storage matches the dimensions. Always true except for
    /// grids deserialized from untrusted bytes.
    pub fn is_well_formed(&self) -> bool {
        self.cells.len() == self.dims.area()
    }

    /// Values without their positions, row by row.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// The up-to-8 neighbouring positions of `point` with their values.
    pub fn neighbors(&self, point: Point) -> impl Iterator<Item = (Point, &T)> {
        self.dims.neighbors(point).map(|p| (p, &self[p]))
    }
}

impl<T> Index<Point> for Grid<T> {
    type Output = T;

    fn index(&self, point: Point) -> &T {
        assert!(self.dims.contains(point), "{point} is outside the grid");
        &self.cells[self.dims.index(point)]
    }
}

impl<T> IndexMut<Point> for Grid<T> {
    fn index_mut(&mut self, point: Point) -> &mut T {
        assert!(self.dims.contains(point), "{point} is outside the grid");
        let index = self.dims.index(point);
        &mut self.cells[index]
    }
}

/// Single-character rendering shared by the visible board and the belief board.
pub trait Symbol: Sized {
    fn symbol(&self) -> char;
    fn from_symbol(symbol: char) -> Option<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseGridError {
    #[error("unrecognised symbol {symbol:?} at row {row}")]
    InvalidSymbol { symbol: char, row: usize },
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("grid is empty")]
    Empty,
}

impl<T: Symbol> Grid<T> {
    /// Parses one row per non-blank line. Whitespace between symbols is ignored.
    pub fn parse(text: &str) -> Result<Self, ParseGridError> {
        let mut cols = None;
        let mut cells = Vec::new();
        let mut rows = 0;

        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let before = cells.len();
            for symbol in line.chars().filter(|c| !c.is_whitespace()) {
                let value = T::from_symbol(symbol)
                    .ok_or(ParseGridError::InvalidSymbol { symbol, row: rows })?;
                cells.push(value);
            }
            let found = cells.len() - before;
            match cols {
                None => cols = Some(found),
                Some(expected) if expected != found => {
                    return Err(ParseGridError::RaggedRow {
                        row: rows,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
            rows += 1;
        }

        let cols = cols.ok_or(ParseGridError::Empty)?;
        Ok(Grid {
            dims: Dimensions { rows, cols },
            cells,
        })
    }
}

impl<T: Symbol> std::fmt::Display for Grid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.dims.rows {
            for x in 0..self.dims.cols {
                if x > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self[Point { x, y }].symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;

    #[test]
    fn test_parse_and_display() {
        let grid: Grid<Cell> = Grid::parse("@ 1\n- *").unwrap();
        assert_eq!(grid.dims(), Dimensions { rows: 2, cols: 2 });
        assert_eq!(grid[Point::new(1, 0)], Cell::Revealed(1));
        assert_eq!(grid.to_string(), "@ 1\n- *\n");
        assert!(grid.is_well_formed());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Grid::<Cell>::parse("@ @\n@").unwrap_err(),
            ParseGridError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
        assert_eq!(Grid::<Cell>::parse("  \n").unwrap_err(), ParseGridError::Empty);
        assert!(matches!(
            Grid::<Cell>::parse("@ x").unwrap_err(),
            ParseGridError::InvalidSymbol { symbol: 'x', row: 0 }
        ));
    }

    #[test]
    fn test_storage_must_match_dimensions() {
        let short = Grid {
            dims: Dimensions { rows: 2, cols: 3 },
            cells: vec![0u8; 5],
        };
        assert!(!short.is_well_formed());
    }
}
