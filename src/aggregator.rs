//! Shared flow table: insert-or-update under a single mutual-exclusion
//! domain, with consistent snapshot iteration (spec.md §4.D, §5).

use std::collections::HashMap;
use std::sync::Mutex;

use crate::flow::{FlowKey, FlowStats, PacketObservation};

/// The aggregator. A single `Mutex` is sufficient because the critical
/// section on the update path is O(1) amortised — one hash lookup plus a
/// handful of small-set inserts (spec.md §4.D).
pub struct Aggregator {
    table: Mutex<HashMap<FlowKey, FlowStats>>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Aggregator {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Atomic insert-or-modify for one packet observation (spec.md §4.C).
    pub fn update(&self, key: FlowKey, obs: &PacketObservation) {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table
            .entry(key)
            .and_modify(|stats| stats.apply(obs))
            .or_insert_with(|| FlowStats::first(obs));
    }

    /// A consistent point-in-time copy of the table. Ordering is
    /// unspecified but stable within a single call.
    pub fn snapshot(&self) -> Vec<(FlowKey, FlowStats)> {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
