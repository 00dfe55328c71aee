//! Exact-sum boolean constraint solving.
//!
//! The inference tiers only ever ask two questions of a constraint system:
//! "what are its solutions" and "which variables have the same value in all
//! of them". [`ConstraintBackend`] captures that contract; [`SatBackend`]
//! answers it with a SAT solver and [`EnumerationBackend`] by exhaustive
//! search.

mod enumerate;
mod sat;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use enumerate::EnumerationBackend;
pub use sat::SatBackend;

use crate::{constraint::Constraint, point::Point};

/// A full or partial mine assignment: `true` means mine.
pub type Assignment = HashMap<Point, bool>;

/// "Exactly `required_mines` of `variables` are mines", borrowed from wherever it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactSum<'a> {
    pub variables: &'a [Point],
    pub required_mines: usize,
}

impl<'a> From<&'a Constraint> for ExactSum<'a> {
    fn from(constraint: &'a Constraint) -> Self {
        ExactSum {
            variables: &constraint.variables,
            required_mines: constraint.required_mines,
        }
    }
}

/// Every distinct variable of a system, sorted.
pub fn system_variables(system: &[ExactSum<'_>]) -> Vec<Point> {
    let mut variables: Vec<Point> = system
        .iter()
        .flat_map(|sum| sum.variables.iter().copied())
        .collect();
    variables.sort_unstable();
    variables.dedup();
    variables
}

pub trait ConstraintBackend {
    /// Satisfying assignments over every variable of `system`, at most `limit`
    /// of them. Empty when the system is unsatisfiable.
    fn solutions(
        &mut self,
        system: &[ExactSum<'_>],
        limit: usize,
    ) -> anyhow::Result<Vec<Assignment>>;

    /// The variables that take the same value in every solution.
    ///
    /// `None` when the system is unsatisfiable, which callers treat as "no
    /// information" rather than an error.
    fn forced(&mut self, system: &[ExactSum<'_>]) -> anyhow::Result<Option<Assignment>> {
        let solutions = self.solutions(system, usize::MAX)?;
        Ok(forced_from_solutions(&solutions))
    }
}

/// Intersects a set of solutions down to the values they all agree on.
pub fn forced_from_solutions(solutions: &[Assignment]) -> Option<Assignment> {
    let (first, rest) = solutions.split_first()?;
    let mut forced = first.clone();
    for solution in rest {
        forced.retain(|point, value| solution.get(point) == Some(value));
    }
    Some(forced)
}

/// Selects a [`ConstraintBackend`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum BackendKind {
    /// CDCL SAT solving with assumption probing.
    Sat,
    /// Exhaustive backtracking search.
    Enumeration,
}

impl BackendKind {
    pub fn build(self) -> Box<dyn ConstraintBackend> {
        match self {
            BackendKind::Sat => Box::new(SatBackend::new()),
            BackendKind::Enumeration => Box::new(EnumerationBackend::new()),
        }
    }
}
