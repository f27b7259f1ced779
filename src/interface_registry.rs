//! Interface id to display-name registry (spec.md §4.J).
//!
//! Kept as a second, independent lock from the [`crate::aggregator::Aggregator`]
//! table — interface identity changes far less often than flow stats, and
//! giving it its own `RwLock` lets readers (writer threads formatting CSV
//! rows) proceed without contending on the hot update path.

use std::collections::HashMap;
use std::sync::RwLock;

/// Opaque handle for a capture interface, stable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub u32);

pub struct InterfaceRegistry {
    names: RwLock<HashMap<InterfaceId, String>>,
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        InterfaceRegistry {
            names: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, id: InterfaceId, label: impl Into<String>) {
        let mut names = self.names.write().unwrap_or_else(|e| e.into_inner());
        names.insert(id, label.into());
    }

    /// Returns the registered label, or a numeric fallback if unregistered.
    pub fn label(&self, id: InterfaceId) -> String {
        let names = self.names.read().unwrap_or_else(|e| e.into_inner());
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("if{}", id.0))
    }

    pub fn len(&self) -> usize {
        self.names.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
