//! The tabu-search driver loop (§4.6): per iteration, every current solution
//! is expanded in parallel (Tier 1, a `rayon` scoped fan-out over `current`);
//! each neighborhood's own candidate enumeration (Tier 2) shares the same
//! `rayon` thread pool, grounded on `monistowl-gat`'s worker-pool-over-tasks
//! layering. Winning candidates merge into one shared `ParetoSet` behind a
//! `Mutex`, mirroring the teacher's `synchronized`-wrapped logger callback.

use std::sync::Mutex;

use rayon::prelude::*;

use crate::config::CONFIG;
use crate::logger::Logger;
use crate::neighborhoods::Neighborhood;
use crate::pareto::{Cost, ParetoSet};
use crate::solutions::{Solution, shuffle_in_place};
use crate::tabu::TabuRegistry;

/// One bounded FIFO tabu registry per neighborhood kind, indexed the same
/// way `Solution::get_neighborhoods` orders them.
struct TabuRegistries {
    registries: Vec<TabuRegistry>,
}

impl TabuRegistries {
    fn new(count: usize, capacity: usize) -> Self {
        Self {
            registries: (0..count).map(|_| TabuRegistry::new(capacity)).collect(),
        }
    }
}

/// Expands one current solution: tries each of its neighborhoods in turn
/// until one yields at least one candidate move (the first "productive"
/// neighborhood wins the iteration for this solution, per §4.6) — every
/// surviving candidate from that neighborhood is materialized, not just a
/// single scalar-best winner, since the driver maintains a genuine Pareto
/// front rather than one current solution. A non-tabu-hit candidate's key is
/// registered in that neighborhood's tabu registry as it is materialized.
/// Falls back to a forced diversification shuffle when every neighborhood
/// comes up empty.
fn expand(solution: &Solution, tabu: &TabuRegistries) -> Vec<(Solution, Option<Neighborhood>, f64)> {
    let mut neighborhoods = solution.get_neighborhoods();
    shuffle_in_place(&mut neighborhoods);

    for neighborhood in neighborhoods {
        let registry = &tabu.registries[neighborhood_index(neighborhood) % tabu.registries.len()];
        let candidates = neighborhood.evaluate(solution, registry);
        if candidates.is_empty() {
            continue;
        }

        return candidates
            .into_iter()
            .map(|candidate| {
                if candidate.to_propagate {
                    registry.add(candidate.tabu_key);
                }
                let violation = candidate.violation;
                (solution.apply(&candidate), Some(neighborhood), violation)
            })
            .collect();
    }

    vec![(solution.shuffle(), None, 0.0)]
}

/// Stable index per neighborhood kind, independent of the per-expansion
/// shuffled try-order, so each kind always consults its own registry.
fn neighborhood_index(neighborhood: crate::neighborhoods::Neighborhood) -> usize {
    use crate::neighborhoods::Neighborhood;
    match neighborhood {
        Neighborhood::Swap(1, 1) => 0,
        Neighborhood::Swap(2, 1) => 1,
        Neighborhood::Swap(2, 2) => 2,
        Neighborhood::Insert(1) => 3,
        Neighborhood::Insert(2) => 4,
        Neighborhood::Swap(..) | Neighborhood::Insert(..) => 4,
    }
}

/// Normalized or raw distance-based ordering functions for the propagation
/// frontier (§6). `extremes` is `(min-per-dimension, max-per-dimension)`
/// across the current candidate pool.
fn priority_score(priority: crate::cli::PropagationPriority, cost: Cost, extremes: (Cost, Cost)) -> f64 {
    use crate::cli::PropagationPriority as P;

    let normalize = |c: Cost| -> Cost {
        let (min, max) = extremes;
        [0, 1].map(|i| {
            let span = (max[i] - min[i]).abs();
            if span < 1e-9 { 0.0 } else { (c[i] - min[i]) / span }
        })
    };

    match priority {
        P::None => 0.0,
        P::MinDistance => {
            let n = normalize(cost);
            (n[0] * n[0] + n[1] * n[1]).sqrt()
        }
        P::MaxDistance => {
            let n = normalize(cost);
            -(n[0] * n[0] + n[1] * n[1]).sqrt()
        }
        P::IdealDistance => {
            let n = normalize(cost);
            let ideal = [0.0, 0.0];
            ((n[0] - ideal[0]).powi(2) + (n[1] - ideal[1]).powi(2)).sqrt()
        }
        P::MinDistanceNoNormalize => (cost[0] * cost[0] + cost[1] * cost[1]).sqrt(),
        P::MaxDistanceNoNormalize => -(cost[0] * cost[0] + cost[1] * cost[1]).sqrt(),
        P::IdealDistanceNoNormalize => {
            let (min, _) = extremes;
            ((cost[0] - min[0]).powi(2) + (cost[1] - min[1]).powi(2)).sqrt()
        }
    }
}

fn cost_extremes(costs: &[Cost]) -> (Cost, Cost) {
    let mut min = [f64::INFINITY, f64::INFINITY];
    let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
    for c in costs {
        for i in 0..2 {
            min[i] = min[i].min(c[i]);
            max[i] = max[i].max(c[i]);
        }
    }
    (min, max)
}

/// Runs `CONFIG.iterations_count` rounds of expansion starting from
/// `Solution::initial()`, returning the final Pareto front after
/// `post_optimization` has been applied to every surviving member (§4.6).
pub fn tabu_search(logger: &mut Logger) -> ParetoSet<Solution> {
    let registries = TabuRegistries::new(5, CONFIG.tabu_size);
    let results: Mutex<ParetoSet<Solution>> = Mutex::new(ParetoSet::new());

    let mut current = vec![Solution::initial()];
    {
        let mut results = results.lock().unwrap();
        for solution in &current {
            results.add(solution.clone());
        }
    }

    for _ in 0..CONFIG.iterations_count {
        let expanded: Vec<(Solution, Option<Neighborhood>, f64)> =
            current.par_iter().flat_map(|solution| expand(solution, &registries)).collect();

        // For each candidate c: results.add(c); if c.to_propagate, it joins
        // the next frontier (§4.6 step 2). A non-propagating candidate
        // (tabu-hit, aspiration-only) still reaches the Pareto set above.
        let mut propagated = Vec::with_capacity(expanded.len());
        {
            let mut results = results.lock().unwrap();
            for (child, neighborhood, violation) in expanded {
                if let Some(neighborhood) = neighborhood {
                    let _ = logger.log(&child, neighborhood, violation);
                }
                results.add(child.clone());
                if child.to_propagate {
                    propagated.push(child);
                }
            }
        }

        propagated.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(std::cmp::Ordering::Equal));
        propagated.dedup_by(|a, b| a == b);

        if propagated.is_empty() {
            propagated = current.iter().map(Solution::shuffle).collect();
        }

        let priority = CONFIG.propagation_priority;
        if priority != crate::cli::PropagationPriority::None {
            let extremes = cost_extremes(&propagated.iter().map(|s| s.cost).collect::<Vec<_>>());
            propagated.sort_by(|a, b| {
                priority_score(priority, a.cost, extremes)
                    .partial_cmp(&priority_score(priority, b.cost, extremes))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        } else {
            shuffle_in_place(&mut propagated);
        }

        propagated.truncate(CONFIG.max_propagation.max(1));
        current = propagated;
    }

    let mut results = results.lock().unwrap();
    let optimized: Vec<Solution> = results.iter().map(Solution::post_optimization).collect();
    let mut final_set = ParetoSet::new();
    for solution in optimized {
        final_set.add(solution);
    }
    final_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PropagationPriority;

    #[test]
    fn min_distance_prefers_the_closer_normalized_point() {
        let extremes = ([0.0, 0.0], [10.0, 10.0]);
        let near = priority_score(PropagationPriority::MinDistance, [1.0, 1.0], extremes);
        let far = priority_score(PropagationPriority::MinDistance, [9.0, 9.0], extremes);
        assert!(near < far);
    }

    #[test]
    fn none_priority_is_a_constant() {
        let extremes = ([0.0, 0.0], [10.0, 10.0]);
        assert_eq!(priority_score(PropagationPriority::None, [1.0, 2.0], extremes), 0.0);
        assert_eq!(priority_score(PropagationPriority::None, [5.0, 9.0], extremes), 0.0);
    }
}
