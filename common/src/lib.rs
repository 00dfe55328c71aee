//! Minesweeper engine with an autonomous constraint-solving player.
//!
//! [`Board`] owns the ground truth and only ever exposes a [`Projection`].
//! [`Player`] mirrors that projection into a [`BeliefBoard`], turns revealed
//! counts into exact-sum [`Constraint`]s and escalates through the inference
//! [`Tier`]s before falling back to a guess.

pub mod backend;
pub mod belief;
pub mod board;
pub mod config;
pub mod constraint;
pub mod error;
pub mod grid;
pub mod player;
pub mod point;
pub mod tiers;

pub use backend::{BackendKind, ConstraintBackend, EnumerationBackend, SatBackend};
pub use belief::{Belief, BeliefBoard};
pub use board::{Board, Cell, GameState, MoveOutcome, Projection, Tile};
pub use config::{GameConfig, PlayerConfig};
pub use constraint::Constraint;
pub use error::GameError;
pub use grid::{Grid, ParseGridError, Symbol};
pub use player::{GuessStrategy, Player, PlayerStats};
pub use point::{Dimensions, Point};
pub use tiers::{Deductions, MineTotal, Tier};
