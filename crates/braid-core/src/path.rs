//! Highest-work path selection.
//!
//! # Overview
//!
//! The highest-work path is the braid's analogue of a best chain: one
//! root-to-tip sequence of beads that the view highlights.
//!
//! # Strategies
//!
//! | Strategy                      | Choice at each step |
//! |-------------------------------|---------------------|
//! | [`PathStrategy::Greedy`]      | Tip with the most work, then repeatedly the parent with the most work. |
//! | [`PathStrategy::Cumulative`]  | The root-to-tip path whose *summed* work is largest. |
//!
//! Greedy is the default. It maximizes each step, not the total, so it can
//! miss the heaviest chain; it is kept as the default because switching
//! changes which beads the view highlights. Cumulative is a longest-path
//! dynamic program over cohort order.
//!
//! Every tie goes to the smallest bead id.
//!
//! # Cyclic residue
//!
//! The greedy walk never revisits a bead. If every parent of the current
//! bead is already on the path the walk stops there, so the first bead may
//! then still have parents. The cumulative strategy only follows parents in
//! strictly earlier cohorts, which rules out cycles by construction.

#![allow(clippy::module_name_repetitions)]

use std::fmt;
use std::str::FromStr;

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cohort::Partition;
use crate::graph::BraidGraph;
use crate::id::BeadId;
use crate::ingest::{WorkMap, sanitize_work};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// How the path is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStrategy {
    /// Per-step maximum work.
    #[default]
    Greedy,
    /// Maximum summed work.
    Cumulative,
}

impl fmt::Display for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Greedy => "greedy",
            Self::Cumulative => "cumulative",
        })
    }
}

impl FromStr for PathStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "cumulative" | "cumulative-work" => Ok(Self::Cumulative),
            other => Err(format!(
                "unknown path strategy '{other}'; use greedy or cumulative"
            )),
        }
    }
}

/// The selected path, root first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HighWorkPath {
    /// Bead ids from root to tip.
    pub beads: Vec<BeadId>,
    /// `(parent, child)` pairs between consecutive beads.
    pub edges: Vec<(BeadId, BeadId)>,
    /// Sum of work over `beads`.
    pub total_work: f64,
}

impl HighWorkPath {
    /// Return an empty path (graph without tips).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` if no bead was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beads.is_empty()
    }

    /// Number of beads on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.beads.len()
    }

    /// `true` if `id` is on the path.
    #[must_use]
    pub fn contains(&self, id: &BeadId) -> bool {
        self.beads.contains(id)
    }

    /// `true` if the link `parent → child` is on the path.
    #[must_use]
    pub fn contains_edge(&self, parent: &BeadId, child: &BeadId) -> bool {
        self.edges.iter().any(|(p, c)| p == parent && c == child)
    }

    /// The tip the path ends at.
    #[must_use]
    pub fn tip(&self) -> Option<&BeadId> {
        self.beads.last()
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Select the greedy highest-work path.
///
/// `work` overrides per-bead work; ids missing from it count as 0.
#[must_use]
#[instrument(skip_all, fields(beads = graph.node_count()))]
pub fn select_path(graph: &BraidGraph, work: &WorkMap) -> HighWorkPath {
    let weights = weights_from(graph, work);
    let path = greedy_walk(graph, &weights);
    assemble(graph, &path, &weights)
}

/// Select a path with an explicit strategy.
///
/// `partition` supplies the cohort order the cumulative strategy needs; the
/// greedy strategy ignores it.
#[must_use]
#[instrument(skip_all, fields(beads = graph.node_count(), strategy = ?strategy))]
pub fn select_path_with(
    graph: &BraidGraph,
    work: &WorkMap,
    strategy: PathStrategy,
    partition: &Partition,
) -> HighWorkPath {
    let weights = weights_from(graph, work);
    let path = match strategy {
        PathStrategy::Greedy => greedy_walk(graph, &weights),
        PathStrategy::Cumulative => cumulative_walk(graph, partition, &weights),
    };
    assemble(graph, &path, &weights)
}

fn weights_from(graph: &BraidGraph, work: &WorkMap) -> Vec<f64> {
    graph
        .beads()
        .map(|b| work.get(&b.id).copied().map_or(0.0, sanitize_work))
        .collect()
}

/// Index with the largest weight; ties go to the smallest index.
fn heaviest(
    candidates: impl Iterator<Item = NodeIndex>,
    weight: impl Fn(NodeIndex) -> f64,
) -> Option<NodeIndex> {
    let mut best: Option<(NodeIndex, f64)> = None;
    for c in candidates {
        let w = weight(c);
        best = match best {
            Some((b, bw)) if bw > w || (bw >= w && b < c) => Some((b, bw)),
            _ => Some((c, w)),
        };
    }
    best.map(|(idx, _)| idx)
}

fn greedy_walk(graph: &BraidGraph, weights: &[f64]) -> Vec<NodeIndex> {
    let Some(tip) = heaviest(graph.tips().into_iter(), |i| weights[i.index()]) else {
        return Vec::new();
    };

    let mut on_path = FixedBitSet::with_capacity(graph.node_count());
    on_path.insert(tip.index());
    let mut path = vec![tip];
    let mut current = tip;

    loop {
        let next = heaviest(
            graph
                .parents_of(current)
                .iter()
                .copied()
                .filter(|p| !on_path.contains(p.index())),
            |i| weights[i.index()],
        );
        match next {
            Some(parent) => {
                on_path.insert(parent.index());
                path.push(parent);
                current = parent;
            }
            None => break,
        }
    }

    path.reverse();
    path
}

fn cumulative_walk(graph: &BraidGraph, partition: &Partition, weights: &[f64]) -> Vec<NodeIndex> {
    let n = graph.node_count();
    let mut best = vec![f64::NEG_INFINITY; n];
    let mut pred: Vec<Option<NodeIndex>> = vec![None; n];

    // Forward pass in cohort order: best[v] = work(v) + max best[parent]
    // over parents in strictly earlier cohorts.
    for (level, members) in partition.cohorts().iter().enumerate() {
        for &v in members.iter().filter(|v| v.index() < n) {
            let parent = heaviest(
                graph
                    .parents_of(v)
                    .iter()
                    .copied()
                    .filter(|&p| partition.cohort_of(p).is_some_and(|c| c < level)),
                |p| best[p.index()],
            );
            let base = parent.map_or(0.0, |p| best[p.index()]);
            best[v.index()] = (base + weights[v.index()]).min(f64::MAX);
            pred[v.index()] = parent;
        }
    }

    let Some(tip) = heaviest(
        graph
            .tips()
            .into_iter()
            .filter(|t| best[t.index()] > f64::NEG_INFINITY),
        |t| best[t.index()],
    ) else {
        return Vec::new();
    };

    let mut path = vec![tip];
    let mut current = tip;
    while let Some(p) = pred[current.index()] {
        path.push(p);
        current = p;
    }
    path.reverse();
    path
}

fn assemble(graph: &BraidGraph, path: &[NodeIndex], weights: &[f64]) -> HighWorkPath {
    if path.is_empty() {
        return HighWorkPath::empty();
    }

    let beads: Vec<BeadId> = path.iter().map(|&i| graph.bead(i).id.clone()).collect();
    let edges = beads
        .windows(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    let total_work = path
        .iter()
        .map(|i| weights[i.index()])
        .sum::<f64>()
        .min(f64::MAX);

    HighWorkPath {
        beads,
        edges,
        total_work,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
