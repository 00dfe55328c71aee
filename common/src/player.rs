use std::collections::{HashMap, HashSet};

use rand::{Rng, SeedableRng, prelude::IndexedRandom, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    backend::{ConstraintBackend, ExactSum},
    belief::{Belief, BeliefBoard},
    board::Projection,
    config::PlayerConfig,
    constraint::{self, build_constraints, build_informative_constraints},
    error::GameError,
    point::Point,
    tiers::{self, Deductions, MineTotal, Tier},
};

/// Upper bound on the solutions enumerated per fringe group when estimating
/// mine probabilities for a weighted guess.
const WEIGHTED_SOLUTION_LIMIT: usize = 4096;

/// How to pick a cell when nothing can be proven safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum GuessStrategy {
    /// Any unknown cell, uniformly at random.
    Uniform,
    /// The unknown cell with the lowest estimated mine probability.
    Weighted,
}

/// Counters describing how a player reached its moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub moves: usize,
    pub guesses: usize,
    /// Safe cells proven by each tier, indexed in pipeline order.
    pub safe_by_tier: [usize; 4],
    /// Mines proven by each tier, indexed in pipeline order.
    pub mines_by_tier: [usize; 4],
}

/// The autonomous player.
///
/// Observes the board's projection, derives constraints from what it has seen,
/// and hands out one coordinate at a time. Proven-safe cells are kept on a
/// stack so the most recent deduction is played first.
pub struct Player {
    mines: usize,
    config: PlayerConfig,
    belief: BeliefBoard,
    queue: Vec<Point>,
    /// Coordinates already handed out, so a queued cell is never served twice.
    issued: HashSet<Point>,
    backend: Box<dyn ConstraintBackend>,
    rng: StdRng,
    stats: PlayerStats,
}

impl Player {
    /// A player with the default configuration for a `rows` x `cols` board.
    pub fn new(rows: usize, cols: usize, mines: usize) -> Self {
        Self::build(rows, cols, mines, PlayerConfig::default())
    }

    /// Fails with [`GameError::UnsupportedPlayerConfig`] when `config` does not validate.
    pub fn with_config(
        rows: usize,
        cols: usize,
        mines: usize,
        config: PlayerConfig,
    ) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self::build(rows, cols, mines, config))
    }

    fn build(rows: usize, cols: usize, mines: usize, config: PlayerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Player {
            mines,
            belief: BeliefBoard::new(rows, cols),
            queue: Vec::new(),
            issued: HashSet::new(),
            backend: config.backend.build(),
            rng,
            stats: PlayerStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn belief(&self) -> &BeliefBoard {
        &self.belief
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Proven-safe cells waiting to be played, most recent last.
    pub fn queued(&self) -> &[Point] {
        &self.queue
    }

    /// Merges the board's latest projection into the player's beliefs.
    pub fn observe(&mut self, projection: &Projection) -> Result<(), GameError> {
        self.belief.observe(projection)
    }

    /// The next cell to reveal, or `None` once no unknown cell is left.
    ///
    /// Proven-safe cells come first. When nothing can be proven the player
    /// guesses, and that guess is the only move that can hit a mine.
    pub fn next_move(&mut self) -> anyhow::Result<Option<Point>> {
        if let Some(point) = self.next_deduced_move()? {
            return Ok(Some(point));
        }

        let Some(guess) = self.guess()? else {
            return Ok(None);
        };
        self.stats.guesses += 1;
        self.queue.push(guess);
        Ok(self.pop_queue())
    }

    /// Like [`Player::next_move`], but returns `None` instead of guessing.
    pub fn next_deduced_move(&mut self) -> anyhow::Result<Option<Point>> {
        loop {
            if let Some(point) = self.pop_queue() {
                return Ok(Some(point));
            }
            if !self.infer()? {
                return Ok(None);
            }
        }
    }

    fn pop_queue(&mut self) -> Option<Point> {
        while let Some(point) = self.queue.pop() {
            let playable = matches!(
                self.belief.get(point),
                Some(Belief::Safe | Belief::Unknown)
            );
            if playable && self.issued.insert(point) {
                self.stats.moves += 1;
                return Some(point);
            }
            log::trace!("discarding stale move {point}");
        }
        None
    }

    /// Runs the tiers in order until one of them deduces something new.
    fn infer(&mut self) -> anyhow::Result<bool> {
        let mut informative = None;

        for tier in self.config.max_tier.up_to() {
            let deductions = match tier {
                Tier::Single => {
                    let constraints = build_constraints(&self.belief);
                    tiers::run(tier, &constraints, self.backend.as_mut())?
                }
                Tier::Global if self.config.mine_total => {
                    let total = self.mine_total();
                    tiers::global(
                        &build_constraints(&self.belief),
                        Some(&total),
                        self.backend.as_mut(),
                    )?
                }
                _ => {
                    let constraints = informative
                        .get_or_insert_with(|| build_informative_constraints(&self.belief));
                    tiers::run(tier, constraints, self.backend.as_mut())?
                }
            };

            if self.apply(tier, &deductions) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn mine_total(&self) -> MineTotal {
        let flagged = self.belief.deduced_mines().count();
        MineTotal {
            unknown: self.belief.unknown().collect(),
            remaining: self.mines.saturating_sub(flagged),
        }
    }

    /// Writes deductions into the beliefs and queues new safe cells.
    /// Returns whether anything changed.
    fn apply(&mut self, tier: Tier, deductions: &Deductions) -> bool {
        let index = tier as usize;
        let mut changed = false;

        for &point in &deductions.mines {
            if self.belief.mark_mine(point) {
                self.stats.mines_by_tier[index] += 1;
                changed = true;
            }
        }
        for &point in &deductions.safe {
            if self.belief.mark_safe(point) {
                self.queue.push(point);
                self.stats.safe_by_tier[index] += 1;
                changed = true;
            }
        }

        if changed {
            log::debug!(
                "tier {tier} deduced {} safe, {} mines",
                deductions.safe.len(),
                deductions.mines.len()
            );
        }
        changed
    }

    fn guess(&mut self) -> anyhow::Result<Option<Point>> {
        let candidates: Vec<Point> = self
            .belief
            .unknown()
            .filter(|p| !self.issued.contains(p))
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }

        let guess = match self.config.guess {
            GuessStrategy::Uniform => self.uniform_guess(),
            GuessStrategy::Weighted => self.weighted_guess(&candidates)?,
        };
        log::debug!("no deduction available, guessing {guess}");
        Ok(Some(guess))
    }

    /// Rejection-samples random coordinates until one lands on a fresh unknown cell.
    fn uniform_guess(&mut self) -> Point {
        let dims = self.belief.dims();
        loop {
            let point = Point {
                x: self.rng.random_range(0..dims.cols),
                y: self.rng.random_range(0..dims.rows),
            };
            if self.belief.get(point) == Some(Belief::Unknown) && !self.issued.contains(&point) {
                return point;
            }
        }
    }

    /// Picks among the candidates with the lowest estimated mine probability.
    ///
    /// Fringe cells are estimated from the fraction of (bounded) solutions of
    /// their constraint group that put a mine there. Every other unknown cell
    /// gets the density of the mines not expected on the fringe.
    fn weighted_guess(&mut self, candidates: &[Point]) -> anyhow::Result<Point> {
        let constraints = build_constraints(&self.belief);
        let mut probability: HashMap<Point, f64> = HashMap::new();

        for group in constraint::components(&constraints) {
            let system: Vec<ExactSum<'_>> = group
                .iter()
                .map(|&i| ExactSum::from(&constraints[i]))
                .collect();
            let solutions = self.backend.solutions(&system, WEIGHTED_SOLUTION_LIMIT)?;
            if solutions.is_empty() {
                continue;
            }
            let total = solutions.len() as f64;
            for point in constraint::variables(group.iter().map(|&i| &constraints[i])) {
                let mines = solutions.iter().filter(|s| s[&point]).count() as f64;
                probability.insert(point, mines / total);
            }
        }

        let expected_fringe: f64 = probability.values().sum();
        let flagged = self.belief.deduced_mines().count() as f64;
        let interior = self
            .belief
            .unknown()
            .filter(|p| !probability.contains_key(p))
            .count();
        let density = if interior == 0 {
            1.0
        } else {
            ((self.mines as f64 - flagged - expected_fringe) / interior as f64).clamp(0.0, 1.0)
        };

        let estimate = |p: &Point| probability.get(p).copied().unwrap_or(density);
        let lowest = candidates
            .iter()
            .map(estimate)
            .fold(f64::INFINITY, f64::min);
        let best: Vec<Point> = candidates
            .iter()
            .copied()
            .filter(|p| estimate(p) <= lowest + 1e-9)
            .collect();
        log::trace!(
            "weighted guess: {} candidates at p={lowest:.3}",
            best.len()
        );

        best.choose(&mut self.rng)
            .copied()
            .ok_or(anyhow::anyhow!("no guess candidates"))
    }
}
