use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate on the minesweeper board.
///
/// `x` is the column and `y` the row. Points are used directly as CSP variable
/// identities, so they are cheap to copy, compare and hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }

    /// Chebyshev distance, i.e. the number of king moves between two points.
    pub fn distance(self, other: Point) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a rectangular grid, shared by every board-like type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub rows: usize,
    pub cols: usize,
}

impl Dimensions {
    /// Total number of positions.
    pub fn area(self) -> usize {
        self.rows * self.cols
    }

    /// Whether `point` lies on the grid.
    pub fn contains(self, point: Point) -> bool {
        point.x < self.cols && point.y < self.rows
    }

    /// Row-major index of a point known to be in bounds.
    pub fn index(self, point: Point) -> usize {
        point.y * self.cols + point.x
    }

    /// Inverse of [`Dimensions::index`].
    pub fn point(self, index: usize) -> Point {
        Point {
            x: index % self.cols,
            y: index / self.cols,
        }
    }

    /// Every point on the grid in row-major order.
    pub fn points(self) -> impl Iterator<Item = Point> {
        (0..self.rows).flat_map(move |y| (0..self.cols).map(move |x| Point { x, y }))
    }

    /// All in-bounds points within `radius` king moves of `point`, excluding the point itself.
    ///
    /// Radius 1 is the Moore neighbourhood (up to 8 cells). Board edges and
    /// corners are handled by clipping.
    pub fn ring(self, point: Point, radius: usize) -> impl Iterator<Item = Point> {
        let r = radius as isize;
        (-r..=r).flat_map(move |dy| {
            (-r..=r).filter_map(move |dx| {
                if dx == 0 && dy == 0 {
                    return None;
                }

                let nx = point.x as isize + dx;
                let ny = point.y as isize + dy;

                if nx >= 0 && nx < self.cols as isize && ny >= 0 && ny < self.rows as isize {
                    Some(Point {
                        x: nx as usize,
                        y: ny as usize,
                    })
                } else {
                    None
                }
            })
        })
    }

    /// The up-to-8 Moore neighbours of a point.
    pub fn neighbors(self, point: Point) -> impl Iterator<Item = Point> {
        self.ring(point, 1)
    }
}
