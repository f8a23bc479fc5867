//! Swap(L1,L2) and Insert(L) move generation (§4.6). Where the teacher's
//! `neighborhoods.rs` walked `Rc<Route>` trees with an inline tabu list and a
//! single aspiration-cost scalar, these neighborhoods enumerate candidate
//! `MoveDescriptor`s in parallel via `rayon` and consult a shared
//! `TabuRegistry`, deferring the actual multi-cost comparison to the caller's
//! `ParetoSet`.

use std::fmt;

use rayon::prelude::*;

use crate::config::CONFIG;
use crate::errors::{D2dError, Result};
use crate::kernels::{self, Feasibility};
use crate::moves::{DroneSortieAppend, DroneSortieUpdate, MoveDescriptor, TabuKey, TechUpdate, accumulate_violation};
use crate::pareto::ParetoSet;
use crate::solutions::Solution;
use crate::tabu::TabuRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighborhood {
    /// Exchange a length-`l1` segment of one route with a length-`l2`
    /// segment of another (or the same) route.
    Swap(usize, usize),
    /// Relocate a length-`l` segment from one route into another, an
    /// existing or a freshly appended one.
    Insert(usize),
}

impl Neighborhood {
    /// Validating constructor: rejects `L2 == 0` or `L2 > L1`, raised
    /// fatally at construction rather than silently producing zero
    /// candidates (§7).
    pub fn swap(l1: usize, l2: usize) -> Result<Self> {
        if l1 == 0 || l2 == 0 || l2 > l1 {
            return Err(D2dError::NeighborhoodConfiguration { l1, l2 });
        }
        Ok(Self::Swap(l1, l2))
    }

    /// Validating constructor: rejects `L == 0` (§7).
    pub fn insert(l: usize) -> Result<Self> {
        if l == 0 {
            return Err(D2dError::NeighborhoodConfiguration { l1: l, l2: 0 });
        }
        Ok(Self::Insert(l))
    }
}

impl fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swap(l1, l2) => write!(f, "Swap({l1},{l2})"),
            Self::Insert(l) => write!(f, "Insert({l})"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RouteRef {
    Drone(usize, usize),
    Tech(usize),
}

fn all_routes(solution: &Solution) -> Vec<RouteRef> {
    let mut routes = Vec::new();
    for (d, sorties) in solution.drone_paths.iter().enumerate() {
        for s in 0..sorties.len() {
            routes.push(RouteRef::Drone(d, s));
        }
    }
    for t in 0..solution.tech_paths.len() {
        routes.push(RouteRef::Tech(t));
    }
    routes
}

fn path_of<'a>(solution: &'a Solution, r: RouteRef) -> &'a [usize] {
    match r {
        RouteRef::Drone(d, s) => &solution.drone_paths[d][s],
        RouteRef::Tech(t) => &solution.tech_paths[t],
    }
}

fn is_drone(r: RouteRef) -> bool {
    matches!(r, RouteRef::Drone(..))
}

fn finish_of(solution: &Solution, r: RouteRef) -> f64 {
    match r {
        RouteRef::Drone(d, s) => *solution.drone_arrival_ts[d][s].last().unwrap_or(&0.0),
        RouteRef::Tech(t) => *solution.tech_arrival_ts[t].last().unwrap_or(&0.0),
    }
}

fn waiting_of(solution: &Solution, r: RouteRef) -> f64 {
    match r {
        RouteRef::Drone(d, s) => solution.drone_waiting[d][s],
        RouteRef::Tech(t) => solution.tech_waiting[t],
    }
}

fn no_violation() -> Feasibility {
    Feasibility {
        capacity_violation: 0.0,
        energy_violation: 0.0,
        endurance_time_violation: 0.0,
        endurance_range_violation: 0.0,
    }
}

/// `(finish timestamp, total waiting, feasibility)` of `path` if it belonged
/// to a drone sortie (`is_drone`) or a technician path.
fn evaluate(is_drone: bool, path: &[usize]) -> (f64, f64, Feasibility) {
    if is_drone {
        let ts = kernels::drone_arrival_timestamps(path, 0.0);
        let wait = kernels::total_waiting(path, &ts, &CONFIG.service_time_drone);
        let finish = *ts.last().unwrap_or(&0.0);
        (finish, wait, kernels::drone_feasibility(path, &ts))
    } else {
        let ts = kernels::technician_arrival_timestamps(path, 0.0);
        let wait = kernels::total_waiting(path, &ts, &CONFIG.service_time_tech);
        (*ts.last().unwrap_or(&0.0), wait, no_violation())
    }
}

fn all_dronable(segment: &[usize]) -> bool {
    segment.iter().all(|&c| CONFIG.dronable[c])
}

/// Builds the `MoveDescriptor` touching routes `a` and (optionally) `b`,
/// given their replacement paths. `b_ref`/`new_b` are `None` when the move
/// only touches one existing route plus a brand new drone sortie.
#[allow(clippy::too_many_arguments)]
fn build_descriptor(
    solution: &Solution,
    a_ref: RouteRef,
    new_a: Vec<usize>,
    b_ref: Option<RouteRef>,
    new_b: Option<Vec<usize>>,
    append_to_drone: Option<usize>,
    append_path: Option<Vec<usize>>,
    tabu_key: TabuKey,
    to_propagate: bool,
) -> MoveDescriptor {
    let mut append_drone = Vec::new();
    let mut update_drone = Vec::new();
    let mut update_tech = Vec::new();

    let mut drone_timespan_delta = 0.0;
    let mut drone_waiting_delta = 0.0;
    let mut tech_timespan_delta = 0.0;
    let mut tech_waiting_delta = 0.0;
    let mut feasibilities = Vec::new();

    let mut touch = |r: RouteRef, path: &[usize]| {
        let (new_finish, new_wait, feasibility) = evaluate(is_drone(r), path);
        let old_finish = finish_of(solution, r);
        let old_wait = waiting_of(solution, r);
        feasibilities.push(feasibility);
        if is_drone(r) {
            drone_timespan_delta += new_finish - old_finish;
            drone_waiting_delta += new_wait - old_wait;
        } else {
            tech_timespan_delta += new_finish - old_finish;
            tech_waiting_delta += new_wait - old_wait;
        }
    };

    touch(a_ref, &new_a);
    match a_ref {
        RouteRef::Drone(d, s) => update_drone.push(DroneSortieUpdate {
            drone: d,
            path_index: s,
            new_path: Some(new_a),
        }),
        RouteRef::Tech(t) => update_tech.push(TechUpdate { technician: t, new_path: new_a }),
    }

    if let (Some(b_ref), Some(new_b)) = (b_ref, new_b) {
        touch(b_ref, &new_b);
        match b_ref {
            RouteRef::Drone(d, s) => update_drone.push(DroneSortieUpdate {
                drone: d,
                path_index: s,
                new_path: Some(new_b),
            }),
            RouteRef::Tech(t) => update_tech.push(TechUpdate { technician: t, new_path: new_b }),
        }
    }

    if let (Some(drone), Some(path)) = (append_to_drone, append_path) {
        let (finish, wait, feasibility) = evaluate(true, &path);
        feasibilities.push(feasibility);
        drone_timespan_delta += finish;
        drone_waiting_delta += wait;
        append_drone.push(DroneSortieAppend { drone, new_path: path });
    }

    MoveDescriptor {
        append_drone,
        update_drone,
        update_tech,
        drone_timespan_delta,
        drone_waiting_delta,
        tech_timespan_delta,
        tech_waiting_delta,
        violation: accumulate_violation(&feasibilities),
        tabu_key,
        to_propagate,
    }
}

fn splice_out(path: &[usize], start: usize, len: usize) -> (Vec<usize>, Vec<usize>) {
    let segment = path[start..start + len].to_vec();
    let mut rest = path[..start].to_vec();
    rest.extend_from_slice(&path[start + len..]);
    (segment, rest)
}

fn splice_in(path: &[usize], at: usize, segment: &[usize]) -> Vec<usize> {
    let mut result = path[..at].to_vec();
    result.extend_from_slice(segment);
    result.extend_from_slice(&path[at..]);
    result
}

/// Dominance-prunes a raw candidate pool, keyed on `(violation, timespan
/// delta)` — mirroring the per-neighborhood Pareto set each worker batch
/// maintains before handing its results back to the driver.
fn prune(candidates: Vec<MoveDescriptor>) -> Vec<MoveDescriptor> {
    let mut set = ParetoSet::new();
    for candidate in candidates {
        set.add(candidate);
    }
    set.into_iter().collect()
}

impl Neighborhood {
    /// Enumerates every candidate move. A move whose tabu key is already
    /// registered is still produced, with `to_propagate = false` — it can
    /// still enter the caller's Pareto set (aspiration), just not the next
    /// iteration's propagation frontier. The raw pool is dominance-pruned
    /// before it is returned.
    pub fn evaluate(self, solution: &Solution, tabu: &TabuRegistry) -> Vec<MoveDescriptor> {
        match self {
            Self::Swap(l1, l2) => prune(self.evaluate_swap(solution, l1, l2, tabu)),
            Self::Insert(l) => prune(self.evaluate_insert(solution, l, tabu)),
        }
    }

    fn evaluate_swap(self, solution: &Solution, l1: usize, l2: usize, tabu: &TabuRegistry) -> Vec<MoveDescriptor> {
        let routes = all_routes(solution);

        routes
            .par_iter()
            .enumerate()
            .flat_map_iter(|(ai, &a_ref)| {
                let a_path = path_of(solution, a_ref);
                let mut found = Vec::new();

                for &b_ref in &routes[ai..] {
                    if a_ref == b_ref && l1 == l2 {
                        continue;
                    }
                    let b_path = path_of(solution, b_ref);

                    for i in 1..a_path.len().saturating_sub(l1) {
                        for j in 1..b_path.len().saturating_sub(l2) {
                            if a_ref == b_ref && i < j + l2 && j < i + l1 {
                                continue; // overlapping segments
                            }

                            let (seg_a, rest_a) = splice_out(a_path, i, l1);
                            let (seg_b, rest_b) = if a_ref == b_ref {
                                splice_out(&rest_a, if j > i { j - l1 } else { j }, l2)
                            } else {
                                splice_out(b_path, j, l2)
                            };

                            if is_drone(a_ref) && !all_dronable(&seg_b) {
                                continue;
                            }
                            if is_drone(b_ref) && !all_dronable(&seg_a) {
                                continue;
                            }

                            let new_a = splice_in(&rest_a, i.min(rest_a.len()), &seg_b);
                            let new_b = if a_ref == b_ref {
                                new_a.clone()
                            } else {
                                splice_in(&rest_b, j.min(rest_b.len()), &seg_a)
                            };

                            let key = TabuKey::new(seg_a[0], seg_b[0]);
                            let to_propagate = !tabu.contains(key);

                            let descriptor = if a_ref == b_ref {
                                build_descriptor(solution, a_ref, new_a, None, None, None, None, key, to_propagate)
                            } else {
                                build_descriptor(
                                    solution,
                                    a_ref,
                                    new_a,
                                    Some(b_ref),
                                    Some(new_b),
                                    None,
                                    None,
                                    key,
                                    to_propagate,
                                )
                            };
                            found.push(descriptor);
                        }
                    }
                }

                found
            })
            .collect()
    }

    fn evaluate_insert(self, solution: &Solution, l: usize, tabu: &TabuRegistry) -> Vec<MoveDescriptor> {
        let routes = all_routes(solution);

        routes
            .par_iter()
            .flat_map_iter(|&a_ref| {
                let a_path = path_of(solution, a_ref);
                let mut found = Vec::new();

                for i in 1..a_path.len().saturating_sub(l) {
                    let (segment, rest_a) = splice_out(a_path, i, l);

                    for &b_ref in &routes {
                        if b_ref == a_ref {
                            continue;
                        }
                        if is_drone(b_ref) && !all_dronable(&segment) {
                            continue;
                        }
                        let b_path = path_of(solution, b_ref);

                        for j in 1..b_path.len() {
                            let new_b = splice_in(b_path, j, &segment);
                            let key = TabuKey::new(segment[0], b_path[j.saturating_sub(1)]);
                            let to_propagate = !tabu.contains(key);

                            found.push(build_descriptor(
                                solution,
                                a_ref,
                                rest_a.clone(),
                                Some(b_ref),
                                Some(new_b),
                                None,
                                None,
                                key,
                                to_propagate,
                            ));
                        }
                    }

                    // A fresh drone sortie starting and ending at the depot.
                    if all_dronable(&segment) {
                        for drone in 0..solution.drone_paths.len() {
                            let mut fresh = vec![0];
                            fresh.extend_from_slice(&segment);
                            fresh.push(0);

                            let key = TabuKey::new(segment[0], 0);
                            let to_propagate = !tabu.contains(key);

                            found.push(build_descriptor(
                                solution,
                                a_ref,
                                rest_a.clone(),
                                None,
                                None,
                                Some(drone),
                                Some(fresh),
                                key,
                                to_propagate,
                            ));
                        }
                    }
                }

                found
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_out_then_in_is_identity() {
        let path = vec![0, 1, 2, 3, 0];
        let (segment, rest) = splice_out(&path, 1, 2);
        assert_eq!(segment, vec![1, 2]);
        assert_eq!(rest, vec![0, 3, 0]);
        assert_eq!(splice_in(&rest, 1, &segment), path);
    }

    #[test]
    fn neighborhood_display_matches_kind() {
        assert_eq!(Neighborhood::Swap(1, 2).to_string(), "Swap(1,2)");
        assert_eq!(Neighborhood::Insert(1).to_string(), "Insert(1)");
    }

    #[test]
    fn swap_rejects_zero_or_oversized_second_length() {
        assert!(Neighborhood::swap(1, 0).is_err());
        assert!(Neighborhood::swap(1, 2).is_err());
        assert!(Neighborhood::swap(2, 1).is_ok());
    }

    #[test]
    fn insert_rejects_zero_length() {
        assert!(Neighborhood::insert(0).is_err());
        assert!(Neighborhood::insert(1).is_ok());
    }
}
