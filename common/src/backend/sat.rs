use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use super::{Assignment, ConstraintBackend, ExactSum, system_variables};
use crate::point::Point;

/// Constraints with at most this many variables use the naive clause encoding.
const NAIVE_ENCODING_LIMIT: usize = 10;

/// Backend built on the varisat CDCL solver.
///
/// Each query builds a fresh solver. Forced variables are found by solving
/// once for a model and then asking, under an assumption, whether each
/// variable can take the opposite value.
#[derive(Debug, Default)]
pub struct SatBackend {}

impl SatBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A solver loaded with a system, plus the mapping from cells to SAT variables.
struct Encoded<'a> {
    solver: Solver<'a>,
    var_map: Vec<(Point, Var)>,
}

impl Encoded<'_> {
    fn new(system: &[ExactSum<'_>]) -> Self {
        let mut solver = Solver::new();

        // 1. Allocate SAT variables for each Point
        let var_map: Vec<(Point, Var)> = system_variables(system)
            .into_iter()
            .map(|point| (point, solver.new_var()))
            .collect();
        let lookup: HashMap<Point, Var> = var_map.iter().copied().collect();

        // 2. Encode all constraints as CNF using batch operations
        let mut formula = CnfFormula::new();
        for sum in system {
            let lits: Vec<Lit> = sum
                .variables
                .iter()
                .map(|p| Lit::from_var(lookup[p], true))
                .collect();
            encode_exactly_k_to_formula(&mut formula, &mut solver, &lits, sum.required_mines);
        }
        solver.add_formula(&formula);

        Encoded { solver, var_map }
    }

    /// Reads the current model as a mine assignment over the cell variables.
    fn assignment(&self) -> anyhow::Result<Assignment> {
        let model: HashSet<Lit> = self
            .solver
            .model()
            .ok_or(anyhow::anyhow!("solver_model_fail"))?
            .into_iter()
            .collect();
        Ok(self
            .var_map
            .iter()
            .map(|&(point, var)| (point, model.contains(&Lit::from_var(var, true))))
            .collect())
    }
}

impl ConstraintBackend for SatBackend {
    fn solutions(
        &mut self,
        system: &[ExactSum<'_>],
        limit: usize,
    ) -> anyhow::Result<Vec<Assignment>> {
        let mut encoded = Encoded::new(system);
        let mut solutions = Vec::new();

        while solutions.len() < limit && encoded.solver.solve()? {
            let assignment = encoded.assignment()?;

            // Block this exact assignment so the next solve finds a different one.
            let blocking: Vec<Lit> = encoded
                .var_map
                .iter()
                .map(|&(point, var)| Lit::from_var(var, !assignment[&point]))
                .collect();
            encoded.solver.add_clause(&blocking);

            solutions.push(assignment);
        }

        Ok(solutions)
    }

    fn forced(&mut self, system: &[ExactSum<'_>]) -> anyhow::Result<Option<Assignment>> {
        let mut encoded = Encoded::new(system);

        if !encoded.solver.solve()? {
            return Ok(None);
        }
        let sample = encoded.assignment()?;

        let mut forced = Assignment::new();
        for &(point, var) in &encoded.var_map {
            let is_mine = sample[&point];
            // The sample already shows `is_mine` is possible; test the other value.
            encoded.solver.assume(&[Lit::from_var(var, !is_mine)]);
            let flippable = encoded.solver.solve()?;
            if !flippable {
                forced.insert(point, is_mine);
            }
        }
        encoded.solver.assume(&[]);

        Ok(Some(forced))
    }
}

/// Encodes an "exactly k" constraint into the CNF formula.
fn encode_exactly_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    if k > vars.len() {
        // Unsatisfiable - add empty clause.
        formula.add_clause(&[]);
        return;
    }
    if k == 0 {
        // All variables must be false.
        for &lit in vars {
            formula.add_clause(&[!lit]);
        }
        return;
    }
    if k == vars.len() {
        for &lit in vars {
            formula.add_clause(&[lit]);
        }
        return;
    }

    if vars.len() <= NAIVE_ENCODING_LIMIT {
        // At most k: every (k+1)-subset has a false literal.
        for combo in vars.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
        // At least k: every (n-k+1)-subset has a true literal.
        for combo in vars.iter().copied().combinations(vars.len() - k + 1) {
            formula.add_clause(&combo);
        }
    } else {
        encode_sequential_counter_to_formula(formula, solver, vars, k);
    }
}

/// Sequential counter encoding for "exactly k" over larger constraints.
///
/// `s[i][j]` holds iff at least `j + 1` of `vars[..=i]` are true, for `j` in
/// `0..=k`. Exactly k then means `s[n-1][k-1]` and not `s[n-1][k]`.
fn encode_sequential_counter_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    let n = vars.len();
    debug_assert!(0 < k && k < n);

    let s: Vec<Vec<Lit>> = (0..n)
        .map(|_| (0..=k).map(|_| Lit::from_var(solver.new_var(), true)).collect())
        .collect();

    // Base case: s[0][0] iff x[0], nothing higher can hold yet.
    formula.add_clause(&[!vars[0], s[0][0]]);
    formula.add_clause(&[vars[0], !s[0][0]]);
    for j in 1..=k {
        formula.add_clause(&[!s[0][j]]);
    }

    for i in 1..n {
        // s[i][0] = s[i-1][0] OR x[i]
        formula.add_clause(&[!s[i][0], s[i - 1][0], vars[i]]);
        formula.add_clause(&[!s[i - 1][0], s[i][0]]);
        formula.add_clause(&[!vars[i], s[i][0]]);

        // s[i][j] = s[i-1][j] OR (x[i] AND s[i-1][j-1])
        for j in 1..=k {
            formula.add_clause(&[!s[i][j], s[i - 1][j], vars[i]]);
            formula.add_clause(&[!s[i][j], s[i - 1][j], s[i - 1][j - 1]]);
            formula.add_clause(&[!s[i - 1][j], s[i][j]]);
            formula.add_clause(&[!vars[i], !s[i - 1][j - 1], s[i][j]]);
        }
    }

    formula.add_clause(&[s[n - 1][k - 1]]);
    formula.add_clause(&[!s[n - 1][k]]);
}
