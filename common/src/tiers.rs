//! The inference tiers, from cheapest to most powerful.
//!
//! Each tier is a pure function from a constraint list to the deductions it
//! can prove. The player runs them in order and stops at the first one that
//! finds something new.

use std::collections::BTreeSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    backend::{ConstraintBackend, ExactSum},
    constraint::{self, Constraint},
    point::Point,
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum Tier {
    /// Each constraint alone: zero remaining mines or all-mines.
    Single,
    /// Every pair of constraints as one CSP.
    Pairs,
    /// Every triple of constraints as one CSP.
    Triples,
    /// All constraints at once.
    Global,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Single, Tier::Pairs, Tier::Triples, Tier::Global];

    /// How many constraints are combined at a time, `None` for all of them.
    pub fn arity(self) -> Option<usize> {
        match self {
            Tier::Single => Some(1),
            Tier::Pairs => Some(2),
            Tier::Triples => Some(3),
            Tier::Global => None,
        }
    }

    /// Tiers up to and including `self`, in pipeline order.
    pub fn up_to(self) -> impl Iterator<Item = Tier> {
        Tier::ALL.into_iter().take_while(move |&tier| tier <= self)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Single => "single",
            Tier::Pairs => "pairs",
            Tier::Triples => "triples",
            Tier::Global => "global",
        };
        f.write_str(name)
    }
}

/// Cells a tier proved safe or proved to be mines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deductions {
    pub safe: BTreeSet<Point>,
    pub mines: BTreeSet<Point>,
}

impl Deductions {
    pub fn is_empty(&self) -> bool {
        self.safe.is_empty() && self.mines.is_empty()
    }

    /// Whether every deduction here is also in `other`.
    pub fn is_subset(&self, other: &Deductions) -> bool {
        self.safe.is_subset(&other.safe) && self.mines.is_subset(&other.mines)
    }

    pub fn insert(&mut self, point: Point, mine: bool) {
        let (into, other) = if mine {
            (&mut self.mines, &self.safe)
        } else {
            (&mut self.safe, &self.mines)
        };
        if other.contains(&point) {
            log::warn!("conflicting deductions for {point}, keeping the first");
            return;
        }
        into.insert(point);
    }

    fn extend(&mut self, forced: impl IntoIterator<Item = (Point, bool)>) {
        for (point, mine) in forced {
            self.insert(point, mine);
        }
    }
}

/// "All unknown cells together hold exactly `remaining` mines."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineTotal {
    pub unknown: Vec<Point>,
    pub remaining: usize,
}

/// Runs one tier over `constraints`.
pub fn run(
    tier: Tier,
    constraints: &[Constraint],
    backend: &mut dyn ConstraintBackend,
) -> anyhow::Result<Deductions> {
    let deductions = match tier {
        Tier::Single => single(constraints),
        Tier::Pairs => combined(constraints, 2, backend)?,
        Tier::Triples => combined(constraints, 3, backend)?,
        Tier::Global => global(constraints, None, backend)?,
    };
    log::debug!(
        "tier {tier}: {} constraints, {} safe, {} mines",
        constraints.len(),
        deductions.safe.len(),
        deductions.mines.len()
    );
    Ok(deductions)
}

/// Tier 1: a constraint needing no more mines clears its cells, one needing
/// a mine in every cell marks them all.
pub fn single(constraints: &[Constraint]) -> Deductions {
    let mut deductions = Deductions::default();
    for constraint in constraints {
        let mine = if constraint.required_mines == 0 {
            false
        } else if constraint.required_mines == constraint.variables.len() {
            true
        } else {
            continue;
        };
        deductions.extend(constraint.variables.iter().map(|&p| (p, mine)));
    }
    deductions
}

/// Tiers 2 and 3: every `arity`-subset of the constraints solved as one CSP.
///
/// A subset whose constraints split into variable-disjoint groups proves
/// exactly what its groups prove separately, so only subsets connected
/// through shared variables are solved, including the smaller ones that
/// every larger subset contains. Fewer than `arity` constraints means no
/// subset exists and nothing is deduced.
pub fn combined(
    constraints: &[Constraint],
    arity: usize,
    backend: &mut dyn ConstraintBackend,
) -> anyhow::Result<Deductions> {
    let mut deductions = Deductions::default();
    if constraints.len() < arity {
        return Ok(deductions);
    }

    let linked: Vec<Vec<bool>> = constraints
        .iter()
        .map(|a| constraints.iter().map(|b| a.shares_variable(b)).collect())
        .collect();

    deductions = single(constraints);
    for size in 2..=arity {
        for subset in (0..constraints.len()).combinations(size) {
            if !is_connected(&subset, &linked) {
                continue;
            }
            let system: Vec<ExactSum<'_>> =
                subset.iter().map(|&i| ExactSum::from(&constraints[i])).collect();
            if let Some(forced) = backend.forced(&system)? {
                deductions.extend(forced);
            }
        }
    }
    Ok(deductions)
}

fn is_connected(subset: &[usize], linked: &[Vec<bool>]) -> bool {
    let mut reached = vec![false; subset.len()];
    let mut stack = vec![0];
    reached[0] = true;
    while let Some(i) = stack.pop() {
        for j in 0..subset.len() {
            if !reached[j] && linked[subset[i]][subset[j]] {
                reached[j] = true;
                stack.push(j);
            }
        }
    }
    reached.into_iter().all(|r| r)
}

/// Tier 4: one CSP over every constraint and every variable.
///
/// Without a mine total, variable-disjoint groups of constraints are solved
/// one at a time. A mine total ties every unknown cell together, so it forces
/// a single system.
pub fn global(
    constraints: &[Constraint],
    total: Option<&MineTotal>,
    backend: &mut dyn ConstraintBackend,
) -> anyhow::Result<Deductions> {
    let mut deductions = Deductions::default();

    if let Some(total) = total {
        let mut system: Vec<ExactSum<'_>> = constraints.iter().map(ExactSum::from).collect();
        system.push(ExactSum {
            variables: &total.unknown,
            required_mines: total.remaining,
        });
        log::trace!(
            "global system with mine total: {} constraints, {} unknown cells",
            constraints.len(),
            total.unknown.len()
        );
        if let Some(forced) = backend.forced(&system)? {
            deductions.extend(forced);
        }
        return Ok(deductions);
    }

    for group in constraint::components(constraints) {
        let system: Vec<ExactSum<'_>> = group
            .iter()
            .map(|&i| ExactSum::from(&constraints[i]))
            .collect();
        if let Some(forced) = backend.forced(&system)? {
            deductions.extend(forced);
        }
    }
    Ok(deductions)
}
