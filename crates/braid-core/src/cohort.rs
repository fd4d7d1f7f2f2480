//! Cohort partitioning: generation-batched topological layering.
//!
//! # Algorithm
//!
//! 1. Seed cohort 0 with every root. With no roots at all, seed with the
//!    smallest-id bead instead (a fallback cohort).
//! 2. The next cohort is every unprocessed child of the *most recent* cohort
//!    whose whole parent list is already processed.
//! 3. When that set is empty but beads remain (disconnected residue, or
//!    parents that never resolve because of gaps upstream), emit the
//!    smallest-id unprocessed bead as a singleton fallback cohort and carry
//!    on from it.
//!
//! Each round processes at least one bead, so there are at most `N` cohorts
//! for `N` beads. Partitioning never fails: malformed upstream data yields a
//! degenerate partition, never an error.
//!
//! Members of each cohort are in ascending id order.

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::graph::BraidGraph;
use crate::id::BeadId;

/// One layer of the partition, as bead ids.
pub type Cohort = Vec<BeadId>;

/// An ordered partition of a [`BraidGraph`] into cohorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    cohorts: Vec<Vec<NodeIndex>>,
    cohort_of: Vec<Option<usize>>,
    fallback: Vec<usize>,
}

impl Partition {
    fn with_beads(bead_count: usize) -> Self {
        Self {
            cohorts: Vec::new(),
            cohort_of: vec![None; bead_count],
            fallback: Vec::new(),
        }
    }

    fn push(&mut self, members: Vec<NodeIndex>, is_fallback: bool) {
        let index = self.cohorts.len();
        for &m in &members {
            self.cohort_of[m.index()] = Some(index);
        }
        if is_fallback {
            self.fallback.push(index);
        }
        self.cohorts.push(members);
    }

    /// Number of cohorts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    /// `true` if there are no cohorts (empty graph).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    /// Cohort members as node indices.
    #[must_use]
    pub fn cohorts(&self) -> &[Vec<NodeIndex>] {
        &self.cohorts
    }

    /// Cohort index of the bead at `idx`, if it was assigned one.
    #[must_use]
    pub fn cohort_of(&self, idx: NodeIndex) -> Option<usize> {
        self.cohort_of.get(idx.index()).copied().flatten()
    }

    /// Indices of cohorts produced by a fallback rule rather than readiness.
    #[must_use]
    pub fn fallback_cohorts(&self) -> &[usize] {
        &self.fallback
    }

    /// `true` if cohort `index` came from a fallback rule.
    #[must_use]
    pub fn is_fallback(&self, index: usize) -> bool {
        self.fallback.binary_search(&index).is_ok()
    }

    /// Size of the largest cohort.
    #[must_use]
    pub fn widest(&self) -> usize {
        self.cohorts.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cohorts as bead ids.
    #[must_use]
    pub fn to_ids(&self, graph: &BraidGraph) -> Vec<Cohort> {
        self.cohorts
            .iter()
            .map(|members| members.iter().map(|&m| graph.bead(m).id.clone()).collect())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Partition `graph` into cohorts.
#[must_use]
#[instrument(skip(graph), fields(beads = graph.node_count()))]
pub fn partition(graph: &BraidGraph) -> Partition {
    let n = graph.node_count();
    let mut partition = Partition::with_beads(n);
    if n == 0 {
        return partition;
    }

    let mut processed = FixedBitSet::with_capacity(n);
    // Smallest unprocessed index. Only ever moves forward.
    let mut cursor = 0usize;

    let roots = graph.roots();
    let (seed, seed_is_fallback) = if roots.is_empty() {
        (vec![NodeIndex::new(0)], true)
    } else {
        (roots, false)
    };
    for &s in &seed {
        processed.insert(s.index());
    }
    let mut remaining = n - seed.len();
    partition.push(seed, seed_is_fallback);

    while remaining > 0 {
        let last = partition.cohorts.last().map_or(&[][..], Vec::as_slice);

        let mut candidates: Vec<NodeIndex> = last
            .iter()
            .flat_map(|&b| graph.children_of(b).iter().copied())
            .filter(|&c| {
                !processed.contains(c.index())
                    && graph
                        .parents_of(c)
                        .iter()
                        .all(|p| processed.contains(p.index()))
            })
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let is_fallback = candidates.is_empty();
        if is_fallback {
            while processed.contains(cursor) {
                cursor += 1;
            }
            candidates.push(NodeIndex::new(cursor));
        }

        for &c in &candidates {
            processed.insert(c.index());
        }
        remaining -= candidates.len();
        partition.push(candidates, is_fallback);
    }

    if !partition.fallback.is_empty() {
        debug!(
            fallback_cohorts = partition.fallback.len(),
            cohorts = partition.len(),
            "partition used singleton fallback"
        );
    }
    partition
}

/// Accept cohorts precomputed by the data source if they are consistent.
///
/// Ids outside the graph are filtered and cohorts left empty are dropped.
/// The result is accepted only if it is non-empty, covers every bead
/// exactly once, and places every bead in a later cohort than all of its
/// parents; otherwise `None`, and the caller should [`partition`].
#[must_use]
pub fn accept_precomputed(graph: &BraidGraph, cohorts: &[Vec<BeadId>]) -> Option<Partition> {
    let n = graph.node_count();
    let mut partition = Partition::with_beads(n);
    let mut seen = FixedBitSet::with_capacity(n);
    let mut covered = 0usize;

    for layer in cohorts {
        let mut members: Vec<NodeIndex> =
            layer.iter().filter_map(|id| graph.node_index(id)).collect();
        if members.is_empty() {
            continue;
        }
        members.sort_unstable();
        for &m in &members {
            if seen.put(m.index()) {
                debug!(bead = %graph.bead(m).id, "precomputed cohorts repeat a bead");
                return None;
            }
        }
        let level = partition.len();
        for &m in &members {
            let early = graph
                .parents_of(m)
                .iter()
                .all(|&p| partition.cohort_of(p).is_some_and(|c| c < level));
            if !early {
                debug!(
                    bead = %graph.bead(m).id,
                    cohort = level,
                    "precomputed cohorts place a bead before its parents"
                );
                return None;
            }
        }
        covered += members.len();
        partition.push(members, false);
    }

    if partition.is_empty() || covered != n {
        debug!(
            covered,
            beads = n,
            "precomputed cohorts do not cover the graph"
        );
        return None;
    }
    Some(partition)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
