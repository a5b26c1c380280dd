use crate::catalog::PatrolOrder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which presets may escalate a detection into tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackablePolicy {
    /// The last `n` presets of the patrol order.
    Last(usize),
    /// Presets whose derived index is listed.
    Indices(Vec<u64>),
    All,
    Disabled,
}

impl Default for TrackablePolicy {
    fn default() -> Self {
        TrackablePolicy::Last(2)
    }
}

/// Positions within a `PatrolOrder` resolved from a `TrackablePolicy`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackableSet {
    positions: BTreeSet<usize>,
}

impl TrackableSet {
    pub fn resolve(policy: &TrackablePolicy, order: &PatrolOrder) -> Self {
        let len = order.len();
        let positions = match policy {
            TrackablePolicy::Last(n) => (len.saturating_sub(*n)..len).collect(),
            TrackablePolicy::Indices(indices) => order
                .iter()
                .enumerate()
                .filter(|(_, preset)| indices.contains(&preset.index))
                .map(|(position, _)| position)
                .collect(),
            TrackablePolicy::All => (0..len).collect(),
            TrackablePolicy::Disabled => BTreeSet::new(),
        };
        Self { positions }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.positions.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }
}
