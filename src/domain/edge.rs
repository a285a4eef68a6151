use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Edge usage - how the source resource depends on the target.
///
/// Ordered by strength: when several references of different usages land on
/// the same (source, target) pair, the strongest one names the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Usage {
    // ============ Body / signature references ============
    Uses,

    // ============ Type hierarchy ============
    Implements,
    Extends,
}

impl Usage {
    pub fn strongest(self, other: Usage) -> Usage {
        self.max(other)
    }
}

/// Edge payload stored in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub usage: Usage,
    /// Number of bytecode sites producing this edge (>= 1).
    pub weight: u32,
}

/// Edge as seen by visitors and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub usage: Usage,
    pub weight: u32,
}
