use serde::{Deserialize, Serialize};

use crate::{backend::BackendKind, error::GameError, player::GuessStrategy, tiers::Tier};

/// Board size, mine density and mine placement seed for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
    /// Seed for mine placement. The same seed always yields the same layout;
    /// `None` draws one from the operating system.
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn new(rows: usize, cols: usize, mines: usize) -> Self {
        GameConfig {
            rows,
            cols,
            mines,
            seed: None,
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        GameConfig {
            seed: Some(seed),
            ..self
        }
    }

    /// 9x9 with 10 mines.
    pub fn beginner() -> Self {
        GameConfig::new(9, 9, 10)
    }

    /// 16x16 with 40 mines.
    pub fn intermediate() -> Self {
        GameConfig::new(16, 16, 40)
    }

    /// 16 rows by 30 columns with 99 mines.
    pub fn expert() -> Self {
        GameConfig::new(16, 30, 99)
    }

    /// Checks that at least one safe tile exists.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.mines >= self.rows * self.cols {
            return Err(GameError::InvalidConfiguration {
                rows: self.rows,
                cols: self.cols,
                mines: self.mines,
            });
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::beginner()
    }
}

/// Tuning knobs for the autonomous player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Most expensive inference tier the pipeline may run before guessing.
    pub max_tier: Tier,
    pub guess: GuessStrategy,
    pub backend: BackendKind,
    /// Add "all unknown cells hold exactly the remaining mines" to the global tier.
    pub mine_total: bool,
    /// Seed for the guessing RNG; `None` draws one from the operating system.
    pub seed: Option<u64>,
}

impl PlayerConfig {
    /// Rejects combinations the player cannot run in bounded time.
    ///
    /// The mine total is one constraint over every unknown cell, which the
    /// enumeration backend would have to expand solution by solution.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.mine_total && self.backend == BackendKind::Enumeration {
            return Err(GameError::UnsupportedPlayerConfig(
                "the mine total needs the SAT backend",
            ));
        }
        Ok(())
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            max_tier: Tier::Global,
            guess: GuessStrategy::Uniform,
            backend: BackendKind::Sat,
            mine_total: false,
            seed: None,
        }
    }
}
