//! Graph construction from raw parent/child adjacency.
//!
//! # Overview
//!
//! [`BraidGraph::build`] normalizes the two adjacency maps a data source
//! provides into a validated in-memory graph with O(1) id lookup, and a
//! [`petgraph`] view of the edge set for the algorithms that want one.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A is a parent of B": B's share references A.
//! The edge set is the union of both declarations, so `B ∈ children[A]` and
//! `A ∈ parents[B]` each produce the edge on their own. Pairs declared on
//! only one side are counted in [`GraphDiagnostics::asymmetric_links`].
//!
//! ## Windowed Data
//!
//! Sources often send a window of the braid. List entries naming beads
//! outside the universe (the union of both maps' keys) are dropped, as are
//! self references and repeated entries. None of these is an error.
//!
//! ## Determinism
//!
//! Beads are inserted in ascending [`BeadId`] order, so `NodeIndex` order is
//! id order and every "smallest id wins" tie-break downstream can compare
//! indices directly. List order within a bead follows the source.
//!
//! ## Cache Invalidation
//!
//! [`BraidGraph::content_hash`] is a BLAKE3 hash of the normalized adjacency
//! and work. Two refreshes with equal hashes produce identical results.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::id::BeadId;
use crate::ingest::{AdjacencyMap, RawBraid, WorkMap, sanitize_work};

// ---------------------------------------------------------------------------
// Bead
// ---------------------------------------------------------------------------

/// A bead (share) with its filtered adjacency.
#[derive(Debug, Clone, PartialEq)]
pub struct Bead {
    pub id: BeadId,
    /// Parents present in the graph, in source order.
    pub parents: Vec<BeadId>,
    /// Children present in the graph, in source order.
    pub children: Vec<BeadId>,
    /// Non-negative work, 0 when the source gave none.
    pub work: f64,
}

impl Bead {
    /// A bead with no (in-graph) parents.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// A bead with no (in-graph) children.
    #[must_use]
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }
}

/// What normalization had to drop or reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphDiagnostics {
    /// List entries naming a bead outside the universe.
    pub dangling_refs: usize,
    /// List entries naming the bead itself.
    pub self_refs: usize,
    /// Repeated entries within one list.
    pub duplicate_refs: usize,
    /// Parent/child pairs declared in only one of the two maps.
    pub asymmetric_links: usize,
}

impl GraphDiagnostics {
    /// `true` if normalization dropped or reconciled anything.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.dangling_refs == 0
            && self.self_refs == 0
            && self.duplicate_refs == 0
            && self.asymmetric_links == 0
    }
}

// ---------------------------------------------------------------------------
// BraidGraph
// ---------------------------------------------------------------------------

/// A normalized share braid.
///
/// Nodes are [`Bead`]s; an edge `A → B` means "A is a parent of B".
#[derive(Debug, Clone)]
pub struct BraidGraph {
    /// Directed graph over the union edge set.
    pub graph: DiGraph<Bead, ()>,
    /// Mapping from bead id to petgraph `NodeIndex`.
    pub node_map: HashMap<BeadId, NodeIndex>,
    /// BLAKE3 content hash of the normalized adjacency and work.
    pub content_hash: String,
    /// Counters for everything normalization dropped.
    pub diagnostics: GraphDiagnostics,
    parent_index: Vec<Vec<NodeIndex>>,
    child_index: Vec<Vec<NodeIndex>>,
}

impl BraidGraph {
    /// Build a graph from parent and child adjacency, with zero work.
    #[must_use]
    pub fn build(parents_by_id: &AdjacencyMap, children_by_id: &AdjacencyMap) -> Self {
        Self::build_with_work(parents_by_id, children_by_id, &WorkMap::new())
    }

    /// Build from a validated [`RawBraid`].
    #[must_use]
    pub fn from_raw(raw: &RawBraid) -> Self {
        Self::build_with_work(&raw.parents, &raw.children, &raw.work)
    }

    /// Build a graph from parent and child adjacency plus per-bead work.
    ///
    /// Work entries for ids outside the universe are ignored.
    #[must_use]
    #[instrument(skip_all, fields(parents = parents_by_id.len(), children = children_by_id.len()))]
    pub fn build_with_work(
        parents_by_id: &AdjacencyMap,
        children_by_id: &AdjacencyMap,
        work_by_id: &WorkMap,
    ) -> Self {
        let universe: BTreeSet<&BeadId> =
            parents_by_id.keys().chain(children_by_id.keys()).collect();

        let mut graph = DiGraph::<Bead, ()>::with_capacity(universe.len(), universe.len());
        let mut node_map: HashMap<BeadId, NodeIndex> = HashMap::with_capacity(universe.len());

        // Step 1: one node per id, in ascending id order.
        for &id in &universe {
            let idx = graph.add_node(Bead {
                id: id.clone(),
                parents: Vec::new(),
                children: Vec::new(),
                work: work_by_id.get(id).copied().map_or(0.0, sanitize_work),
            });
            node_map.insert(id.clone(), idx);
        }

        // Step 2: filter each declared list against the universe.
        let mut diagnostics = GraphDiagnostics::default();
        let mut parent_index = vec![Vec::new(); universe.len()];
        let mut child_index = vec![Vec::new(); universe.len()];

        for (i, &id) in universe.iter().enumerate() {
            let (parents, p_idx) =
                filter_refs(id, parents_by_id.get(id), &node_map, &mut diagnostics);
            let (children, c_idx) =
                filter_refs(id, children_by_id.get(id), &node_map, &mut diagnostics);
            parent_index[i] = p_idx;
            child_index[i] = c_idx;
            let bead = &mut graph[NodeIndex::new(i)];
            bead.parents = parents;
            bead.children = children;
        }

        // Step 3: union edge set, added in sorted order.
        let mut declared_by_child: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        let mut declared_by_parent: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        for (i, parents) in parent_index.iter().enumerate() {
            for &p in parents {
                declared_by_child.insert((p, NodeIndex::new(i)));
            }
        }
        for (i, children) in child_index.iter().enumerate() {
            for &c in children {
                declared_by_parent.insert((NodeIndex::new(i), c));
            }
        }
        diagnostics.asymmetric_links = declared_by_child
            .symmetric_difference(&declared_by_parent)
            .count();

        let mut edges: Vec<(NodeIndex, NodeIndex)> = declared_by_child
            .union(&declared_by_parent)
            .copied()
            .collect();
        edges.sort_unstable();
        for (p, c) in edges {
            graph.add_edge(p, c, ());
        }

        let content_hash = compute_content_hash(&graph);

        if !diagnostics.is_clean() {
            debug!(?diagnostics, "normalized braid adjacency");
        }

        Self {
            graph,
            node_map,
            content_hash,
            diagnostics,
            parent_index,
            child_index,
        }
    }

    /// Return the number of beads.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// `true` for a graph with no beads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Return the number of distinct parent → child links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// `true` if a bead with this id exists.
    #[must_use]
    pub fn contains(&self, id: &BeadId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Look up the `NodeIndex` for a bead id.
    #[must_use]
    pub fn node_index(&self, id: &BeadId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Look up a bead by id.
    #[must_use]
    pub fn get(&self, id: &BeadId) -> Option<&Bead> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    /// Return the bead at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn bead(&self, idx: NodeIndex) -> &Bead {
        &self.graph[idx]
    }

    /// Iterate beads in ascending id order.
    pub fn beads(&self) -> impl Iterator<Item = &Bead> {
        self.graph.node_weights()
    }

    /// Root beads (no in-graph parents), ascending id order.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.parent_index[idx.index()].is_empty())
            .collect()
    }

    /// Tip beads (no in-graph children), ascending id order.
    #[must_use]
    pub fn tips(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.child_index[idx.index()].is_empty())
            .collect()
    }

    /// Declared parents of `idx`, in source order.
    #[must_use]
    pub fn parents_of(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.parent_index
            .get(idx.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Declared children of `idx`, in source order.
    #[must_use]
    pub fn children_of(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_index
            .get(idx.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Work of the bead at `idx`.
    #[must_use]
    pub fn work_of(&self, idx: NodeIndex) -> f64 {
        self.graph.node_weight(idx).map_or(0.0, |b| b.work)
    }

    /// Per-bead work as a map (beads with zero work included).
    #[must_use]
    pub fn work_map(&self) -> WorkMap {
        self.beads().map(|b| (b.id.clone(), b.work)).collect()
    }

    /// All links as `(parent, child)` index pairs, sorted.
    #[must_use]
    pub fn links(&self) -> Vec<(NodeIndex, NodeIndex)> {
        use petgraph::visit::EdgeRef;

        let mut links: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| (e.source(), e.target()))
            .collect();
        links.sort_unstable();
        links
    }

    /// Return the content hash used for identity-refresh detection.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Drop dangling, self and repeated references from one declared list.
fn filter_refs(
    owner: &BeadId,
    declared: Option<&Vec<BeadId>>,
    node_map: &HashMap<BeadId, NodeIndex>,
    diagnostics: &mut GraphDiagnostics,
) -> (Vec<BeadId>, Vec<NodeIndex>) {
    let Some(declared) = declared else {
        return (Vec::new(), Vec::new());
    };

    let mut ids = Vec::with_capacity(declared.len());
    let mut indices = Vec::with_capacity(declared.len());
    for id in declared {
        if id == owner {
            diagnostics.self_refs += 1;
            continue;
        }
        let Some(&idx) = node_map.get(id) else {
            diagnostics.dangling_refs += 1;
            continue;
        };
        if indices.contains(&idx) {
            diagnostics.duplicate_refs += 1;
            continue;
        }
        ids.push(id.clone());
        indices.push(idx);
    }
    (ids, indices)
}

/// Compute a BLAKE3 hash of the normalized adjacency and work.
fn compute_content_hash(graph: &DiGraph<Bead, ()>) -> String {
    let mut hasher = blake3::Hasher::new();
    for bead in graph.node_weights() {
        bead.id.hash_into(&mut hasher);
        hasher.update(&bead.work.to_le_bytes());
        hasher.update(b"p");
        for p in &bead.parents {
            p.hash_into(&mut hasher);
        }
        hasher.update(b"c");
        for c in &bead.children {
            c.hash_into(&mut hasher);
        }
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
