use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    belief::{Belief, BeliefBoard},
    point::Point,
};

/// Represents a single exact-sum constraint for the CSP backends.
///
/// For example, a revealed '2' touching one deduced mine creates a constraint
/// that exactly 1 mine must be among its unknown neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// The revealed cell this constraint was read from.
    pub anchor: Point,
    /// The exact number of mines that must be present among the constraint's variables.
    pub required_mines: usize,
    /// The unknown cells this constraint applies to.
    pub variables: Vec<Point>,
}

impl Constraint {
    pub fn new(anchor: Point, required_mines: usize, variables: Vec<Point>) -> Self {
        Constraint {
            anchor,
            required_mines,
            variables,
        }
    }

    pub fn shares_variable(&self, other: &Constraint) -> bool {
        self.variables.iter().any(|v| other.variables.contains(v))
    }

    /// Whether an assignment (true = mine) puts exactly the required number of
    /// mines on the variables.
    pub fn is_satisfied_by(&self, assignment: &HashMap<Point, bool>) -> bool {
        self.variables
            .iter()
            .filter(|v| assignment.get(v).copied().unwrap_or(false))
            .count()
            == self.required_mines
    }
}

/// Reads the constraint for one revealed cell, if it still touches unknown cells.
pub fn formulate(belief: &BeliefBoard, anchor: Point) -> Option<Constraint> {
    let Some(Belief::Count(count)) = belief.get(anchor) else {
        return None;
    };

    let mut variables = Vec::new();
    let mut flagged = 0;
    for (neighbor, value) in belief.grid().neighbors(anchor) {
        match value {
            Belief::Unknown => variables.push(neighbor),
            Belief::Mine => flagged += 1,
            // Safe and revealed neighbours contribute nothing.
            Belief::Safe | Belief::Count(_) => {}
        }
    }

    if variables.is_empty() {
        return None;
    }
    let Some(required_mines) = usize::from(count).checked_sub(flagged) else {
        log::warn!("{anchor} shows {count} but touches {flagged} deduced mines");
        return None;
    };

    Some(Constraint {
        anchor,
        required_mines,
        variables,
    })
}

/// One constraint per fringe tile, in row-major anchor order.
pub fn build_constraints(belief: &BeliefBoard) -> Vec<Constraint> {
    belief
        .dims()
        .points()
        .filter_map(|anchor| formulate(belief, anchor))
        .collect()
}

/// A fringe tile with no other fringe tile within two king moves.
///
/// Its constraint cannot share a variable with any other constraint, so
/// combining it with others never yields more than it does alone.
pub fn is_two_degree_island(belief: &BeliefBoard, anchor: Point) -> bool {
    belief.is_fringe(anchor) && !belief.dims().ring(anchor, 2).any(|p| belief.is_fringe(p))
}

/// The constraints worth feeding to the multi-constraint tiers.
pub fn build_informative_constraints(belief: &BeliefBoard) -> Vec<Constraint> {
    let constraints = build_constraints(belief);
    let before = constraints.len();
    let informative: Vec<Constraint> = constraints
        .into_iter()
        .filter(|c| !is_two_degree_island(belief, c.anchor))
        .collect();
    if informative.len() < before {
        log::trace!("pruned {} two-degree islands", before - informative.len());
    }
    informative
}

/// Every distinct variable, sorted.
pub fn variables<'a>(constraints: impl IntoIterator<Item = &'a Constraint>) -> Vec<Point> {
    constraints
        .into_iter()
        .flat_map(|c| c.variables.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Groups constraint indices into sets linked by shared variables.
///
/// Constraints in different groups are independent and can be solved apart.
pub fn components(constraints: &[Constraint]) -> Vec<Vec<usize>> {
    let mut owner: HashMap<Point, usize> = HashMap::new();
    let mut parent: Vec<usize> = (0..constraints.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for (i, constraint) in constraints.iter().enumerate() {
        for &variable in &constraint.variables {
            match owner.get(&variable).copied() {
                Some(j) => {
                    let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                    parent[a] = b;
                }
                None => {
                    owner.insert(variable, i);
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for i in 0..constraints.len() {
        let root = find(&mut parent, i);
        let index = *slot.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(i);
    }
    groups
}
