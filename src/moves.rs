//! Lightweight, IPC-friendly description of a Solution transformation. A
//! `MoveDescriptor` never carries a cloned `Solution` — only the handful of
//! paths it replaces plus the already-computed cost delta — so that the
//! payload crossing the worker-pool boundary stays proportional to the
//! number of winning moves, not to the enumerated search space (§4.7).

use std::hash::{Hash, Hasher};

use crate::kernels::Feasibility;
use crate::pareto::{Cost, HasCost, round4};

/// Canonical identifier of a move at the semantic level of the customers it
/// relocates. Always stored sorted `(min, max)`, per spec.md §9's resolved
/// open question (the reference implementation canonicalizes inconsistently;
/// this crate does not).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TabuKey(pub usize, pub usize);

impl TabuKey {
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

/// Replace an existing sortie (`Some`) or remove it entirely (`None`).
#[derive(Clone, Debug)]
pub struct DroneSortieUpdate {
    pub drone: usize,
    pub path_index: usize,
    pub new_path: Option<Vec<usize>>,
}

#[derive(Clone, Debug)]
pub struct DroneSortieAppend {
    pub drone: usize,
    pub new_path: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct TechUpdate {
    pub technician: usize,
    pub new_path: Vec<usize>,
}

/// A compact record describing how to transform a parent `Solution` (§3).
#[derive(Clone, Debug)]
pub struct MoveDescriptor {
    pub append_drone: Vec<DroneSortieAppend>,
    pub update_drone: Vec<DroneSortieUpdate>,
    pub update_tech: Vec<TechUpdate>,

    pub drone_timespan_delta: f64,
    pub drone_waiting_delta: f64,
    pub tech_timespan_delta: f64,
    pub tech_waiting_delta: f64,

    pub violation: f64,
    pub tabu_key: TabuKey,

    /// False when `tabu_key` hit the neighborhood's tabu registry at
    /// generation time: the candidate still enters the Pareto set (it may
    /// dominate something — the aspiration case) but is not carried into the
    /// next iteration's propagation frontier.
    pub to_propagate: bool,
}

impl MoveDescriptor {
    pub fn is_empty(&self) -> bool {
        self.append_drone.is_empty() && self.update_drone.is_empty() && self.update_tech.is_empty()
    }
}

/// Sums the continuous violation amounts of every touched route, so a move
/// touching two routes (or appending a fresh sortie) carries one combined
/// figure rather than the caller tracking a running total by hand.
pub fn accumulate_violation(feasibilities: &[Feasibility]) -> f64 {
    feasibilities.iter().map(Feasibility::violation).sum()
}

/// `(violation, the larger of the two timespan deltas)` — the same composite
/// the driver uses to rank candidates, reused here so a neighborhood can
/// locally Pareto-prune its candidate pool before returning it.
impl HasCost for MoveDescriptor {
    fn cost(&self) -> Cost {
        round4([self.violation, self.drone_timespan_delta.max(self.tech_timespan_delta)])
    }
}

impl PartialEq for MoveDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.tabu_key == other.tabu_key && self.cost() == other.cost()
    }
}

impl Eq for MoveDescriptor {}

impl Hash for MoveDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tabu_key.hash(state);
        let cost = self.cost();
        cost[0].to_bits().hash(state);
        cost[1].to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabu_key_is_canonicalized() {
        assert_eq!(TabuKey::new(5, 2), TabuKey::new(2, 5));
        assert_eq!(TabuKey::new(2, 5), TabuKey(2, 5));
    }

    #[test]
    fn accumulate_violation_sums_every_touched_route() {
        let feasibilities = [
            Feasibility {
                capacity_violation: 0.5,
                energy_violation: 0.0,
                endurance_time_violation: 0.0,
                endurance_range_violation: 0.0,
            },
            Feasibility {
                capacity_violation: 0.0,
                energy_violation: 0.25,
                endurance_time_violation: 0.0,
                endurance_range_violation: 0.0,
            },
        ];
        assert_eq!(accumulate_violation(&feasibilities), 0.75);
    }
}
