//! Per-neighborhood-class bounded FIFO of recently applied move keys (§4.4).
//! Extracted from the inline rotate/evict logic in the teacher's
//! `neighborhoods.rs::search()` into its own type, generalized to the
//! canonical `TabuKey` this crate uses everywhere.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::moves::TabuKey;

pub struct TabuRegistry {
    inner: Mutex<TabuInner>,
}

struct TabuInner {
    order: VecDeque<TabuKey>,
    capacity: usize,
}

impl TabuRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(TabuInner {
                order: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    pub fn contains(&self, key: TabuKey) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.order.contains(&key)
    }

    /// Appends `key`; if already present, rotates it to the tail instead of
    /// duplicating it, so a repeatedly re-applied move is not evicted
    /// sooner than a move applied once.
    pub fn add(&self, key: TabuKey) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(pos) = inner.order.iter().position(|&k| k == key) {
            inner.order.remove(pos);
        }
        inner.order.push_back(key);

        let capacity = inner.capacity;
        while inner.order.len() > capacity {
            inner.order.pop_front();
        }
    }

    pub fn reset(&self, capacity: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.capacity = capacity;
        while inner.order.len() > capacity {
            inner.order.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<TabuKey> {
        self.inner.lock().unwrap().order.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_keeps_last_m_distinct_keys() {
        let registry = TabuRegistry::new(3);
        for i in 0..10 {
            registry.add(TabuKey::new(i, i + 1));
        }
        assert_eq!(registry.len(), 3);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot, vec![TabuKey::new(7, 8), TabuKey::new(8, 9), TabuKey::new(9, 10)]);
    }

    #[test]
    fn re_adding_an_existing_key_rotates_to_tail() {
        let registry = TabuRegistry::new(3);
        registry.add(TabuKey::new(1, 2));
        registry.add(TabuKey::new(2, 3));
        registry.add(TabuKey::new(3, 4));
        registry.add(TabuKey::new(1, 2));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot, vec![TabuKey::new(2, 3), TabuKey::new(3, 4), TabuKey::new(1, 2)]);
    }

    #[test]
    fn contains_reflects_current_membership() {
        let registry = TabuRegistry::new(1);
        assert!(!registry.contains(TabuKey::new(5, 6)));
        registry.add(TabuKey::new(5, 6));
        assert!(registry.contains(TabuKey::new(5, 6)));
        registry.add(TabuKey::new(7, 8));
        assert!(!registry.contains(TabuKey::new(5, 6)));
    }
}
