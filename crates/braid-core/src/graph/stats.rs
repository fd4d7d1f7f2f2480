//! Summary statistics for a braid and its partition.
//!
//! # Statistics Provided
//!
//! - **bead_count** / **link_count**: size of the normalized graph.
//! - **root_count** / **tip_count**: beads with no parents / no children.
//! - **density**: `link_count / (bead_count * (bead_count - 1))`, 0.0 for
//!   graphs with fewer than two beads.
//! - **component_count**: weakly connected components. Greater than 1 means
//!   the window contains disjoint sub-braids.
//! - **cyclic**: whether the edge set contains a cycle. Real braids never do;
//!   truncated or stale windows occasionally look like they do.
//! - **cohort_count** / **widest_cohort** / **fallback_cohorts**: shape of the
//!   partition, including how many cohorts the fallback rule had to emit.
//! - **max_parents** / **max_children**: widest merge and widest fork.
//! - **diagnostics**: what normalization dropped.

use petgraph::{
    Direction,
    algo::{connected_components, is_cyclic_directed},
    visit::IntoNodeIdentifiers,
};
use serde::Serialize;

use crate::cohort::Partition;
use crate::graph::build::{BraidGraph, GraphDiagnostics};

// ---------------------------------------------------------------------------
// GraphStats
// ---------------------------------------------------------------------------

/// Summary statistics for a braid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub bead_count: usize,
    pub link_count: usize,
    pub root_count: usize,
    pub tip_count: usize,
    /// Zero for graphs with 0 or 1 bead.
    pub density: f64,
    /// Number of weakly connected components.
    pub component_count: usize,
    /// `true` if the edge set contains a directed cycle.
    pub cyclic: bool,
    pub cohort_count: usize,
    pub widest_cohort: usize,
    /// Cohorts emitted by the singleton/seed fallback.
    pub fallback_cohorts: usize,
    /// Largest number of in-graph parents on one bead.
    pub max_parents: usize,
    /// Largest number of in-graph children on one bead.
    pub max_children: usize,
    pub diagnostics: GraphDiagnostics,
}

impl GraphStats {
    /// Compute statistics from a graph and its partition.
    #[must_use]
    pub fn from_graph(graph: &BraidGraph, partition: &Partition) -> Self {
        let bead_count = graph.node_count();
        let link_count = graph.link_count();

        let max_parents = graph
            .graph
            .node_identifiers()
            .map(|idx| {
                graph
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .max()
            .unwrap_or(0);

        let max_children = graph
            .graph
            .node_identifiers()
            .map(|idx| {
                graph
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .count()
            })
            .max()
            .unwrap_or(0);

        Self {
            bead_count,
            link_count,
            root_count: graph.roots().len(),
            tip_count: graph.tips().len(),
            density: compute_density(bead_count, link_count),
            component_count: connected_components(&graph.graph),
            cyclic: is_cyclic_directed(&graph.graph),
            cohort_count: partition.len(),
            widest_cohort: partition.widest(),
            fallback_cohorts: partition.fallback_cohorts().len(),
            max_parents,
            max_children,
            diagnostics: graph.diagnostics,
        }
    }

    /// `true` if the braid has no links at all.
    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.link_count == 0
    }

    /// `true` if the partition needed any fallback cohort.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.fallback_cohorts > 0
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0_f64;
    }
    let max_edges = (node_count * (node_count - 1)) as f64;
    edge_count as f64 / max_edges
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
