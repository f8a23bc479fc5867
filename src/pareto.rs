//! Keyed, dominance-pruning container mapping a rounded cost vector to the
//! set of members sharing that cost (§4.5). Grounded directly on
//! `original_source/ts/abc/multi_ob/costs.py`'s `ParetoSet`/
//! `BaseMulticostComparison`/`cost_dominate`/`isclose` — the teacher has no
//! Rust counterpart at all, since its own driver is single-objective.

use std::collections::HashMap;
use std::collections::HashSet;
use std::hash::Hash;

pub type Cost = [f64; 2];

/// `isclose` per `original_source/ts/utils/py_utils.py`: a plain absolute
/// tolerance, not the relative+absolute form spec.md's prose mentions in
/// passing (see DESIGN.md's open-question log).
const ISCLOSE_TOLERANCE: f64 = 1e-4;

pub fn isclose(a: f64, b: f64) -> bool {
    (a - b).abs() < ISCLOSE_TOLERANCE
}

pub fn round4(cost: Cost) -> Cost {
    [
        (cost[0] * 10000.0).round() / 10000.0,
        (cost[1] * 10000.0).round() / 10000.0,
    ]
}

/// `a` dominates `b`: component-wise `a[i] <= b[i]` with at least one strict
/// inequality once near-equal components are collapsed by `isclose`.
pub fn cost_dominate(a: Cost, b: Cost) -> bool {
    let mut strictly_better = false;
    for i in 0..2 {
        if isclose(a[i], b[i]) {
            continue;
        }
        if a[i] > b[i] {
            return false;
        }
        strictly_better = true;
    }
    strictly_better
}

pub trait HasCost {
    fn cost(&self) -> Cost;
}

/// A key type wrapping a rounded `Cost` so it can live in a `HashMap`
/// (`f64` has no `Eq`/`Hash`; the rounding to 4 decimals makes bitwise
/// equality on the rounded value meaningful).
#[derive(Clone, Copy, Debug, PartialEq)]
struct CostKey(Cost);

impl Eq for CostKey {}

impl Hash for CostKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0[0].to_bits().hash(state);
        self.0[1].to_bits().hash(state);
    }
}

pub struct ParetoSet<T> {
    buckets: HashMap<CostKey, HashSet<T>>,
    len: usize,
}

impl<T> Default for ParetoSet<T> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            len: 0,
        }
    }
}

impl<T> ParetoSet<T>
where
    T: HasCost + Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `item`, pruning any bucket it dominates. Returns
    /// `(inserted, evicted)`: `inserted` is false only when an existing
    /// bucket dominates `item`'s cost; `evicted` lists every member removed
    /// because `item` dominated their bucket.
    pub fn add(&mut self, item: T) -> (bool, Vec<T>) {
        let key = CostKey(round4(item.cost()));

        if let Some(bucket) = self.buckets.get_mut(&key) {
            if bucket.insert(item) {
                self.len += 1;
            }
            return (true, Vec::new());
        }

        if self.buckets.keys().any(|k| cost_dominate(k.0, key.0)) {
            return (false, Vec::new());
        }

        let dominated_keys: Vec<CostKey> = self
            .buckets
            .keys()
            .filter(|k| cost_dominate(key.0, k.0))
            .copied()
            .collect();

        let mut evicted = Vec::new();
        for k in dominated_keys {
            if let Some(bucket) = self.buckets.remove(&k) {
                self.len -= bucket.len();
                evicted.extend(bucket);
            }
        }

        let mut bucket = HashSet::new();
        bucket.insert(item);
        self.buckets.insert(key, bucket);
        self.len += 1;

        (true, evicted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buckets.values().flatten()
    }

    /// Cost vector -> bucket cardinality, used by the propagation-priority
    /// functions (§6).
    pub fn counter(&self) -> HashMap<Cost, usize> {
        self.buckets.iter().map(|(k, v)| (k.0, v.len())).collect()
    }

    /// No two members dominate each other — the invariant every returned
    /// Pareto set must satisfy (§8).
    pub fn no_member_dominates_another(&self) -> bool {
        let costs: Vec<Cost> = self.buckets.keys().map(|k| k.0).collect();
        for (i, &a) in costs.iter().enumerate() {
            for &b in &costs[i + 1..] {
                if cost_dominate(a, b) || cost_dominate(b, a) {
                    return false;
                }
            }
        }
        true
    }
}

impl<T> IntoIterator for ParetoSet<T>
where
    T: HasCost + Eq + Hash + Clone,
{
    type Item = T;
    type IntoIter = std::iter::Flatten<std::vec::IntoIter<HashSet<T>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_values().collect::<Vec<_>>().into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    struct Fixture(Cost);

    impl HasCost for Fixture {
        fn cost(&self) -> Cost {
            self.0
        }
    }

    #[test]
    fn isclose_collapses_near_equal_components() {
        assert!(isclose(1.0, 1.00001));
        assert!(!isclose(1.0, 1.001));
    }

    #[test]
    fn cost_dominate_requires_one_strict_improvement() {
        assert!(cost_dominate([1.0, 2.0], [1.0, 3.0]));
        assert!(!cost_dominate([1.0, 2.0], [1.0, 2.0]));
        assert!(!cost_dominate([2.0, 2.0], [1.0, 3.0]));
    }

    #[test]
    fn pareto_add_with_dominance_yields_exact_members() {
        // Scenario 4 from §8: (10,20), then (10,15), then (11,14).
        let mut set = ParetoSet::new();
        set.add(Fixture([10.0, 20.0]));
        set.add(Fixture([10.0, 15.0]));
        set.add(Fixture([11.0, 14.0]));

        let mut costs: Vec<Cost> = set.iter().map(HasCost::cost).collect();
        costs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(costs, vec![[10.0, 15.0], [11.0, 14.0]]);
        assert!(set.no_member_dominates_another());
    }

    #[test]
    fn dominated_insert_is_rejected() {
        let mut set = ParetoSet::new();
        set.add(Fixture([1.0, 1.0]));
        let (inserted, evicted) = set.add(Fixture([2.0, 2.0]));
        assert!(!inserted);
        assert!(evicted.is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn equal_cost_members_share_a_bucket() {
        let mut set = ParetoSet::new();
        set.add(Fixture([1.0, 1.0]));
        set.add(Fixture([1.0, 1.0]));
        assert_eq!(set.len(), 1);
    }
}
