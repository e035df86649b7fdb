//! In-memory snapshot cache keyed by FilterState content hash.
//!
//! A refresh invalidates everything; recomputation is lazy, on the next
//! read. Bounded FIFO: when capacity is hit the oldest insertion goes.

use pulseboard_core::domain::StateKey;
use std::collections::HashMap;

use crate::pipeline::DashboardSnapshot;

/// Cache for aggregation output.
#[derive(Debug)]
pub struct SnapshotCache {
    entries: HashMap<StateKey, DashboardSnapshot>,
    insertion_order: Vec<StateKey>,
    capacity: usize,
}

impl SnapshotCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &StateKey) -> Option<&DashboardSnapshot> {
        self.entries.get(key)
    }

    pub fn put(&mut self, snapshot: DashboardSnapshot) {
        let key = snapshot.state_key.clone();
        if self.entries.insert(key.clone(), snapshot).is_none() {
            self.insertion_order.push(key);
            if self.insertion_order.len() > self.capacity {
                let evicted = self.insertion_order.remove(0);
                self.entries.remove(&evicted);
            }
        }
    }

    /// Drop every cached snapshot. Called on refresh completion so stale
    /// aggregation output can never be served after new data landed.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
