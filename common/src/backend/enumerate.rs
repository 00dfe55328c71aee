use std::collections::HashMap;

use super::{Assignment, ConstraintBackend, ExactSum, system_variables};
use crate::point::Point;

/// Exhaustive backtracking over the variables, pruning any branch where a
/// constraint already has too many mines or can no longer reach its target.
///
/// Exponential in the worst case; meant for small systems and as a reference
/// for the SAT backend.
#[derive(Debug, Default)]
pub struct EnumerationBackend {}

impl EnumerationBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

struct Search<'s> {
    variables: Vec<Point>,
    /// For each variable, the constraints it appears in.
    touches: Vec<Vec<usize>>,
    required: Vec<usize>,
    /// Mines placed so far per constraint.
    placed: Vec<usize>,
    /// Variables not yet assigned per constraint.
    open: Vec<usize>,
    values: Vec<bool>,
    limit: usize,
    solutions: &'s mut Vec<Assignment>,
}

impl Search<'_> {
    fn run(&mut self, index: usize) {
        if self.solutions.len() >= self.limit {
            return;
        }
        if index == self.variables.len() {
            let solution = self
                .variables
                .iter()
                .copied()
                .zip(self.values.iter().copied())
                .collect();
            self.solutions.push(solution);
            return;
        }

        for value in [false, true] {
            if self.assign(index, value) {
                self.values[index] = value;
                self.run(index + 1);
            }
            self.unassign(index, value);
        }
    }

    /// Applies one assignment to the running counts and reports whether every
    /// touched constraint can still be met.
    fn assign(&mut self, index: usize, mine: bool) -> bool {
        let mut feasible = true;
        for &c in &self.touches[index] {
            self.open[c] -= 1;
            self.placed[c] += usize::from(mine);
            feasible &= self.placed[c] <= self.required[c]
                && self.placed[c] + self.open[c] >= self.required[c];
        }
        feasible
    }

    fn unassign(&mut self, index: usize, mine: bool) {
        for &c in &self.touches[index] {
            self.open[c] += 1;
            self.placed[c] -= usize::from(mine);
        }
    }
}

impl ConstraintBackend for EnumerationBackend {
    fn solutions(
        &mut self,
        system: &[ExactSum<'_>],
        limit: usize,
    ) -> anyhow::Result<Vec<Assignment>> {
        let mut solutions = Vec::new();

        // Constraints over no variables are decided up front.
        if system
            .iter()
            .any(|sum| sum.variables.is_empty() && sum.required_mines != 0)
        {
            return Ok(solutions);
        }

        let variables = system_variables(system);
        let position: HashMap<Point, usize> = variables
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, i))
            .collect();
        let mut touches = vec![Vec::new(); variables.len()];
        for (c, sum) in system.iter().enumerate() {
            for p in sum.variables {
                touches[position[p]].push(c);
            }
        }

        let mut search = Search {
            values: vec![false; variables.len()],
            variables,
            touches,
            required: system.iter().map(|sum| sum.required_mines).collect(),
            placed: vec![0; system.len()],
            open: system.iter().map(|sum| sum.variables.len()).collect(),
            limit,
            solutions: &mut solutions,
        };
        search.run(0);

        log::trace!(
            "enumerated {} solutions over {} variables",
            solutions.len(),
            position.len()
        );
        Ok(solutions)
    }
}
