//! The immutable `Solution` record (§3, §4.2). Field shape and the
//! clusterize + nearest-neighbor construction walk are kept from the
//! teacher's `solutions.rs::Solution`; the scalar `working_time`/penalty
//! `cost()` is replaced with the bi-objective `[timespan, waiting]` vector
//! grounded on `original_source/ts/abc/multi_ob/costs.py`.

use std::hash::{Hash, Hasher};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::clusterize::clusterize;
use crate::config::CONFIG;
use crate::kernels;
use crate::moves::MoveDescriptor;
use crate::pareto::{Cost, HasCost, round4};

/// One drone's back-to-back sorties, or one technician's single path.
pub type Path = Vec<usize>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Solution {
    pub drone_paths: Vec<Vec<Path>>,
    #[serde(rename = "technician_paths")]
    pub tech_paths: Vec<Path>,

    #[serde(skip)]
    pub drone_arrival_ts: Vec<Vec<Vec<f64>>>,
    #[serde(skip)]
    pub tech_arrival_ts: Vec<Vec<f64>>,
    #[serde(skip)]
    pub drone_timespan: Vec<f64>,
    #[serde(skip)]
    pub drone_waiting: Vec<Vec<f64>>,
    #[serde(skip)]
    pub tech_waiting: Vec<f64>,

    pub cost: Cost,

    #[serde(skip, default = "default_to_propagate")]
    pub to_propagate: bool,
}

fn default_to_propagate() -> bool {
    true
}

impl HasCost for Solution {
    fn cost(&self) -> Cost {
        self.cost
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_drone_paths() == other.canonical_drone_paths()
            && self.tech_paths == other.tech_paths
            && round4(self.cost) == round4(other.cost)
    }
}

impl Eq for Solution {}

impl Hash for Solution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_drone_paths().hash(state);
        self.tech_paths.hash(state);
        let cost = round4(self.cost);
        cost[0].to_bits().hash(state);
        cost[1].to_bits().hash(state);
    }
}

impl Solution {
    fn canonical_drone_paths(&self) -> Vec<Path> {
        let mut all: Vec<Path> = self.drone_paths.iter().flatten().cloned().collect();
        all.sort();
        all
    }

    /// Total construction: computes every derived field from `drone_paths`
    /// and `tech_paths` alone (§4.2). Consecutive sorties on the same drone
    /// are contiguous in time: each sortie's offset is the previous
    /// sortie's completion timestamp.
    pub fn new(drone_paths: Vec<Vec<Path>>, tech_paths: Vec<Path>) -> Self {
        let mut drone_arrival_ts = Vec::with_capacity(drone_paths.len());
        let mut drone_waiting = Vec::with_capacity(drone_paths.len());
        let mut drone_timespan = Vec::with_capacity(drone_paths.len());

        for sorties in &drone_paths {
            let mut ts_per_sortie = Vec::with_capacity(sorties.len());
            let mut waiting_per_sortie = Vec::with_capacity(sorties.len());
            let mut offset = 0.0;
            for path in sorties {
                let ts = kernels::drone_arrival_timestamps(path, offset);
                let waiting = kernels::total_waiting(path, &ts, &CONFIG.service_time_drone);
                offset = *ts.last().unwrap_or(&offset);
                ts_per_sortie.push(ts);
                waiting_per_sortie.push(waiting);
            }
            drone_timespan.push(offset);
            drone_arrival_ts.push(ts_per_sortie);
            drone_waiting.push(waiting_per_sortie);
        }

        let mut tech_arrival_ts = Vec::with_capacity(tech_paths.len());
        let mut tech_waiting = Vec::with_capacity(tech_paths.len());
        for path in &tech_paths {
            let ts = kernels::technician_arrival_timestamps(path, 0.0);
            tech_waiting.push(kernels::total_waiting(path, &ts, &CONFIG.service_time_tech));
            tech_arrival_ts.push(ts);
        }

        let timespan = drone_timespan
            .iter()
            .copied()
            .chain(tech_arrival_ts.iter().map(|ts| *ts.last().unwrap_or(&0.0)))
            .fold(0.0_f64, f64::max);
        let waiting: f64 = drone_waiting.iter().flatten().sum::<f64>() + tech_waiting.iter().sum::<f64>();

        Self {
            drone_paths,
            tech_paths,
            drone_arrival_ts,
            tech_arrival_ts,
            drone_timespan,
            drone_waiting,
            tech_waiting,
            cost: [timespan, waiting],
            to_propagate: true,
        }
    }

    /// Every customer 1..n appears exactly once, dronable constraints hold,
    /// and every sortie satisfies capacity plus (energy xor endurance) for
    /// the active drone variant (§4.2).
    pub fn feasible(&self) -> bool {
        let n = CONFIG.customers_count;
        let mut seen = vec![false; n + 1];

        for sorties in &self.drone_paths {
            for path in sorties {
                for &c in &path[1..path.len() - 1] {
                    if c == 0 || seen[c] || !CONFIG.dronable[c] {
                        return false;
                    }
                    seen[c] = true;
                }

                let ts = kernels::drone_arrival_timestamps(path, 0.0);
                if !kernels::drone_feasibility(path, &ts).is_feasible() {
                    return false;
                }
            }
        }

        for path in &self.tech_paths {
            for &c in &path[1..path.len() - 1] {
                if c == 0 || seen[c] {
                    return false;
                }
                seen[c] = true;
            }
        }

        seen[1..].iter().all(|&s| s)
    }

    /// Deterministic starting solution (§4.2): non-dronable customers go to
    /// technicians round-robin nearest-neighbor; remaining customers go to
    /// drones the same way, closing a sortie when it would become
    /// infeasible and (in ENDURANCE mode) falling back to the nearest
    /// technician when even a fresh sortie can't serve the node.
    pub fn initial() -> Self {
        let n = CONFIG.customers_count;
        let mut dronable: Vec<usize> = (1..=n).filter(|&c| CONFIG.dronable[c]).collect();
        let mut non_dronable: Vec<usize> = (1..=n).filter(|&c| !CONFIG.dronable[c]).collect();

        let technicians = CONFIG.trucks_count.max(1);
        let drones = CONFIG.drones_count.max(1);

        let mut tech_paths: Vec<Path> = vec![vec![0, 0]; technicians];
        let tech_buckets = clusterize(&mut non_dronable, technicians);
        for (t, bucket) in tech_buckets.into_iter().enumerate() {
            tech_paths[t] = nearest_neighbor_route(bucket);
        }

        let mut drone_paths: Vec<Vec<Path>> = vec![Vec::new(); drones];
        let drone_buckets = clusterize(&mut dronable, drones);
        for (d, bucket) in drone_buckets.into_iter().enumerate() {
            let ordered = nearest_neighbor_order(&bucket);
            let mut sortie: Vec<usize> = vec![0];

            for customer in ordered {
                let mut trial = sortie.clone();
                trial.push(customer);
                let mut closed = trial.clone();
                closed.push(0);

                let ts = kernels::drone_arrival_timestamps(&closed, 0.0);
                if kernels::drone_feasibility(&closed, &ts).is_feasible() {
                    sortie = trial;
                    continue;
                }

                // The current sortie can't take this customer: close it off
                // (if non-empty) and try a fresh one with just this customer.
                if sortie.len() > 1 {
                    let mut finished = sortie.clone();
                    finished.push(0);
                    drone_paths[d].push(finished);
                }

                let fresh = vec![0, customer, 0];
                let fresh_ts = kernels::drone_arrival_timestamps(&fresh, 0.0);
                if kernels::drone_feasibility(&fresh, &fresh_ts).is_feasible() {
                    sortie = vec![0, customer];
                } else {
                    // Even a lone sortie can't serve it (ENDURANCE range/time);
                    // hand it to the technician with the nearest penultimate stop.
                    sortie = vec![0];
                    assign_to_nearest_technician(&mut tech_paths, customer);
                }
            }

            if sortie.len() > 1 {
                sortie.push(0);
                drone_paths[d].push(sortie);
            }
        }

        Self::new(drone_paths, tech_paths)
    }

    /// Independently for each drone sortie and each technician path, with
    /// probability 1/2 reverse the path (depot endpoints fixed) (§4.2).
    pub fn shuffle(&self) -> Self {
        let mut rng = rand::rng();

        let drone_paths = self
            .drone_paths
            .iter()
            .map(|sorties| sorties.iter().map(|path| maybe_reverse_internal(path, &mut rng)).collect())
            .collect();

        let tech_paths = self
            .tech_paths
            .iter()
            .map(|path| maybe_reverse_internal(path, &mut rng))
            .collect();

        Self::new(drone_paths, tech_paths)
    }

    /// The deterministic neighborhood list every Solution exposes to the
    /// driver: Swap(1,1), Swap(2,1), Swap(2,2), Insert(1), Insert(2) (§4.6).
    /// These lengths are fixed constants, not user input, so construction
    /// cannot fail; the validating constructor is used anyway so that
    /// invariant stays enforced in one place.
    pub fn get_neighborhoods(&self) -> Vec<crate::neighborhoods::Neighborhood> {
        use crate::neighborhoods::Neighborhood;
        vec![
            Neighborhood::swap(1, 1).expect("fixed neighborhood constant"),
            Neighborhood::swap(2, 1).expect("fixed neighborhood constant"),
            Neighborhood::swap(2, 2).expect("fixed neighborhood constant"),
            Neighborhood::insert(1).expect("fixed neighborhood constant"),
            Neighborhood::insert(2).expect("fixed neighborhood constant"),
        ]
    }

    /// Applies a `MoveDescriptor` against `self`, producing a new,
    /// independently-constructed child Solution. Never mutates `self`. The
    /// child inherits `descriptor.to_propagate`: false when the move's tabu
    /// key hit the originating neighborhood's registry, so it still joins
    /// the Pareto set but is excluded from the next propagation frontier.
    pub fn apply(&self, descriptor: &MoveDescriptor) -> Self {
        let mut drone_paths = self.drone_paths.clone();
        let mut tech_paths = self.tech_paths.clone();

        for append in &descriptor.append_drone {
            drone_paths[append.drone].push(append.new_path.clone());
        }
        for update in &descriptor.update_drone {
            match &update.new_path {
                Some(path) => drone_paths[update.drone][update.path_index] = path.clone(),
                None => {
                    drone_paths[update.drone].remove(update.path_index);
                }
            }
        }
        for update in &descriptor.update_tech {
            tech_paths[update.technician] = update.new_path.clone();
        }

        let mut child = Self::new(drone_paths, tech_paths);
        child.to_propagate = descriptor.to_propagate;
        child
    }

    pub fn post_optimization(&self) -> Self {
        self.clone()
    }
}

fn maybe_reverse_internal(path: &Path, rng: &mut impl Rng) -> Path {
    if path.len() <= 3 {
        // 0 or 1 internal node: reversing is a no-op.
        return path.clone();
    }

    if rng.random_bool(0.5) {
        let mut reversed = path.clone();
        reversed[1..path.len() - 1].reverse();
        reversed
    } else {
        path.clone()
    }
}

fn nearest_neighbor_order(customers: &[usize]) -> Vec<usize> {
    let mut remaining = customers.to_vec();
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut current = 0usize;

    while !remaining.is_empty() {
        let (idx, _) = remaining
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| CONFIG.drone_distances[current][a].total_cmp(&CONFIG.drone_distances[current][b]))
            .unwrap();
        current = remaining.remove(idx);
        ordered.push(current);
    }

    ordered
}

fn nearest_neighbor_route(customers: Vec<usize>) -> Path {
    let mut remaining = customers;
    let mut route = vec![0];
    let mut current = 0usize;

    while !remaining.is_empty() {
        let (idx, _) = remaining
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| CONFIG.truck_distances[current][a].total_cmp(&CONFIG.truck_distances[current][b]))
            .unwrap();
        current = remaining.remove(idx);
        route.push(current);
    }

    route.push(0);
    route
}

fn assign_to_nearest_technician(tech_paths: &mut [Path], customer: usize) {
    let (t, _) = tech_paths
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            let a_penultimate = a[a.len().saturating_sub(2)];
            let b_penultimate = b[b.len().saturating_sub(2)];
            CONFIG.truck_distances[a_penultimate][customer].total_cmp(&CONFIG.truck_distances[b_penultimate][customer])
        })
        .unwrap();

    let insert_at = tech_paths[t].len() - 1;
    tech_paths[t].insert(insert_at, customer);
}

/// Shuffles a slice in place the way neighborhoods shuffle their candidate
/// enumeration order, via `rand::seq::SliceRandom`.
pub fn shuffle_in_place<T>(items: &mut [T]) {
    items.shuffle(&mut rand::rng());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ordering_is_independent_of_input_order() {
        let a = vec![3usize, 1, 2];
        let mut b = a.clone();
        b.sort_unstable();
        assert_eq!(b, vec![1, 2, 3]);
    }
}
