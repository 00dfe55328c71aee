use thiserror::Error;

use crate::point::{Dimensions, Point};

/// Errors surfaced by the board engine and the player boundary.
///
/// Hitting a mine is not an error, it is the [`Loss`](crate::MoveOutcome::Loss) outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid configuration: {mines} mines do not fit on a {rows}x{cols} board")]
    InvalidConfiguration {
        rows: usize,
        cols: usize,
        mines: usize,
    },
    #[error("({x}, {y}) is outside the board")]
    OutOfBounds { x: usize, y: usize },
    #[error("({x}, {y}) has already been revealed")]
    AlreadyRevealed { x: usize, y: usize },
    #[error("the game has already ended")]
    GameEnded,
    #[error("unsupported player configuration: {0}")]
    UnsupportedPlayerConfig(&'static str),
    #[error(
        "expected a {}x{} grid, got {}x{}",
        expected.rows,
        expected.cols,
        actual.rows,
        actual.cols
    )]
    DimensionMismatch {
        expected: Dimensions,
        actual: Dimensions,
    },
}

impl GameError {
    pub(crate) fn out_of_bounds(point: Point) -> Self {
        GameError::OutOfBounds {
            x: point.x,
            y: point.y,
        }
    }

    /// Whether the caller can simply pick another coordinate and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GameError::OutOfBounds { .. } | GameError::AlreadyRevealed { .. }
        )
    }
}
