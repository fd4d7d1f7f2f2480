//! Render-ready view of one analysed braid.
//!
//! The view is plain data: every field is owned, ordered deterministically
//! and serializable, so a front end can draw it without touching the graph.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::cohort::{Cohort, Partition};
use crate::graph::BraidGraph;
use crate::id::BeadId;
use crate::layout::{Position, Positions};
use crate::path::HighWorkPath;

/// One bead as drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewNode {
    pub id: BeadId,
    pub cohort: Option<usize>,
    pub is_tip: bool,
    pub is_root: bool,
    pub work: f64,
    pub x: f64,
    pub y: f64,
    pub on_path: bool,
}

/// One parent → child link as drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewLink {
    pub source: BeadId,
    pub target: BeadId,
    pub on_path: bool,
}

/// Nodes, links and cohorts of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BraidView {
    /// Ascending id order.
    pub nodes: Vec<ViewNode>,
    /// Ascending `(source, target)` order.
    pub links: Vec<ViewLink>,
    pub cohorts: Vec<Cohort>,
    pub path: HighWorkPath,
    pub content_hash: String,
}

impl BraidView {
    /// Combine the stage outputs into one view.
    ///
    /// A bead missing from `positions` is drawn at the origin; [`layout`]
    /// never produces such a map.
    ///
    /// [`layout`]: crate::layout::layout
    #[must_use]
    pub fn assemble(
        graph: &BraidGraph,
        partition: &Partition,
        path: &HighWorkPath,
        positions: &Positions,
    ) -> Self {
        let on_path: BTreeSet<&BeadId> = path.beads.iter().collect();
        let path_edges: BTreeSet<(&BeadId, &BeadId)> =
            path.edges.iter().map(|(p, c)| (p, c)).collect();

        let nodes = graph
            .graph
            .node_indices()
            .map(|idx| {
                let bead = graph.bead(idx);
                let pos = positions.get(&bead.id).copied().unwrap_or_default();
                ViewNode {
                    id: bead.id.clone(),
                    cohort: partition.cohort_of(idx),
                    is_tip: bead.is_tip(),
                    is_root: bead.is_root(),
                    work: bead.work,
                    x: pos.x,
                    y: pos.y,
                    on_path: on_path.contains(&bead.id),
                }
            })
            .collect();

        let links = graph
            .links()
            .into_iter()
            .map(|(p, c)| {
                let (source, target) = (&graph.bead(p).id, &graph.bead(c).id);
                ViewLink {
                    on_path: path_edges.contains(&(source, target)),
                    source: source.clone(),
                    target: target.clone(),
                }
            })
            .collect();

        Self {
            nodes,
            links,
            cohorts: partition.to_ids(graph),
            path: path.clone(),
            content_hash: graph.content_hash().to_owned(),
        }
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &BeadId) -> Option<&ViewNode> {
        self.nodes
            .binary_search_by(|n| n.id.cmp(id))
            .ok()
            .map(|i| &self.nodes[i])
    }

    /// Position of `id`, if drawn.
    #[must_use]
    pub fn position(&self, id: &BeadId) -> Option<Position> {
        self.node(id).map(|n| Position { x: n.x, y: n.y })
    }

    /// Ids of every bead in the view.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<BeadId> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }
}
