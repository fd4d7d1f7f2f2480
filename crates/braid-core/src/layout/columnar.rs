//! Columnar braid layout.
//!
//! x is a function of cohort index alone: cohort `i` of `C` sits at
//! `left + i * span / (C - 1)` where `span = zoom * (width - 2 * pad_x)`,
//! centered on the canvas. A single cohort sits at the horizontal middle.
//!
//! y is assigned cohort by cohort:
//!
//! - Cohort 0 spreads around the vertical center, heaviest subtree first,
//!   alternating above and below with a parabolic spacing so the outermost
//!   roots reach the padded edges.
//! - Later cohorts compute each bead's desired y as the mean of its
//!   already-placed parents' y, weighted by each parent's fan-out. Beads are
//!   ordered by desired y (bucketed by `bucket_tolerance`), then larger
//!   descendant count, then id, and dropped into evenly spaced slots centered
//!   on the cohort's mean desired y. Beads forking to more than two children
//!   are pulled toward the center by `center_bias`.
//! - Every cohort then gets an overlap pass enforcing `min_spacing`,
//!   compressing proportionally when the cohort is taller than the canvas.
//!
//! Beads the partition never assigned go to the overflow column at
//! `x = width + overflow_gap`.

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use tracing::debug;

use super::{Canvas, LayoutError, LayoutParams, Position};
use crate::cohort::Partition;
use crate::graph::BraidGraph;

pub(super) fn place(
    graph: &BraidGraph,
    partition: &Partition,
    params: &LayoutParams,
    canvas: &Canvas,
) -> Result<Vec<Position>, LayoutError> {
    let n = graph.node_count();
    if partition.is_empty() {
        return Err(LayoutError::EmptyPartition);
    }
    if let Some(stray) = partition
        .cohorts()
        .iter()
        .flatten()
        .find(|m| m.index() >= n)
    {
        return Err(LayoutError::ForeignPartition {
            index: stray.index(),
        });
    }

    let xs = column_xs(partition.len(), canvas);
    let counts = descendant_counts(graph, partition);
    let mut ys = vec![canvas.center_y(); n];
    let mut placed = FixedBitSet::with_capacity(n);
    let mut positions = vec![Position::default(); n];

    for (level, members) in partition.cohorts().iter().enumerate() {
        if level == 0 {
            place_roots(members, &counts, canvas, &mut ys);
        } else {
            place_cohort(graph, members, &counts, &placed, params, canvas, &mut ys);
        }
        resolve_overlaps(members, &mut ys, params.min_spacing, canvas);
        for &m in members {
            placed.insert(m.index());
            positions[m.index()] = Position {
                x: xs[level],
                y: ys[m.index()],
            };
        }
    }

    let unassigned: Vec<usize> = (0..n).filter(|&i| !placed.contains(i)).collect();
    if !unassigned.is_empty() {
        debug!(
            count = unassigned.len(),
            "beads outside the partition go to the overflow column"
        );
        let x = params.overflow_x();
        let step = canvas.usable_height() / as_f64(unassigned.len());
        for (slot, &i) in unassigned.iter().enumerate() {
            positions[i] = Position {
                x,
                y: step.mul_add(as_f64(slot) + 0.5, canvas.top()),
            };
        }
    }

    Ok(positions)
}

#[allow(clippy::cast_precision_loss)]
const fn as_f64(n: usize) -> f64 {
    n as f64
}

/// x coordinate of each cohort column; strictly increasing.
fn column_xs(count: usize, canvas: &Canvas) -> Vec<f64> {
    if count <= 1 {
        return vec![canvas.width / 2.0; count];
    }
    let span = canvas.zoom * 2.0f64.mul_add(-canvas.pad_x, canvas.width);
    let left = (canvas.width - span) / 2.0;
    let step = span / as_f64(count - 1);
    (0..count)
        .map(|i| step.mul_add(as_f64(i), left))
        .collect()
}

/// Number of descendant paths below each bead, indexed by node.
///
/// `count(b)` is the sum over children `c` of `1 + count(c)`, saturating.
/// Computed in one reverse pass over the cohorts so every child that sits
/// in a later cohort is already tallied; a child not yet tallied (cyclic
/// residue, or a bead outside the partition) contributes just 1.
#[must_use]
pub fn descendant_counts(graph: &BraidGraph, partition: &Partition) -> Vec<u64> {
    let n = graph.node_count();
    let mut counts = vec![0u64; n];
    let mut done = FixedBitSet::with_capacity(n);

    for members in partition.cohorts().iter().rev() {
        for &b in members.iter().filter(|b| b.index() < n) {
            tally(graph, b, &mut counts, &mut done);
        }
    }
    for b in graph.graph.node_indices() {
        if !done.contains(b.index()) {
            tally(graph, b, &mut counts, &mut done);
        }
    }
    counts
}

fn tally(graph: &BraidGraph, b: NodeIndex, counts: &mut [u64], done: &mut FixedBitSet) {
    let total = graph.children_of(b).iter().fold(0u64, |acc, c| {
        let below = if done.contains(c.index()) {
            counts[c.index()].saturating_add(1)
        } else {
            1
        };
        acc.saturating_add(below)
    });
    counts[b.index()] = total;
    done.insert(b.index());
}

/// Cohort 0: heaviest first at the center, then alternating above and
/// below with quadratically growing offsets.
fn place_roots(members: &[NodeIndex], counts: &[u64], canvas: &Canvas, ys: &mut [f64]) {
    let mut order = members.to_vec();
    order.sort_by(|a, b| counts[b.index()].cmp(&counts[a.index()]).then(a.cmp(b)));

    let center = canvas.center_y();
    let half = canvas.usable_height() / 2.0;
    let reach = as_f64((order.len() / 2).max(1));

    for (rank, idx) in order.iter().enumerate() {
        let t = as_f64(rank.div_ceil(2)) / reach;
        let offset = half * t * t;
        ys[idx.index()] = if rank % 2 == 1 {
            center - offset
        } else {
            center + offset
        };
    }
}

fn place_cohort(
    graph: &BraidGraph,
    members: &[NodeIndex],
    counts: &[u64],
    placed: &FixedBitSet,
    params: &LayoutParams,
    canvas: &Canvas,
    ys: &mut [f64],
) {
    if members.is_empty() {
        return;
    }
    let center = canvas.center_y();
    let mut order: Vec<(NodeIndex, f64)> = members
        .iter()
        .map(|&m| (m, desired_y(graph, m, placed, ys, center)))
        .collect();
    let mean = order.iter().map(|&(_, y)| y).sum::<f64>() / as_f64(order.len());

    let tol = params.bucket_tolerance;
    order.sort_by(|&(a, ya), &(b, yb)| {
        bucket(ya, tol)
            .cmp(&bucket(yb, tol))
            .then_with(|| counts[b.index()].cmp(&counts[a.index()]))
            .then(a.cmp(&b))
    });

    let gaps = as_f64(order.len() - 1);
    let spacing = if order.len() > 1 {
        params.node_spacing.min(canvas.usable_height() / gaps)
    } else {
        0.0
    };
    let half_block = spacing * gaps / 2.0;
    let (lo, hi) = (canvas.top() + half_block, canvas.bottom() - half_block);
    let block_center = if lo <= hi { mean.clamp(lo, hi) } else { center };

    let bias = params.center_bias;
    for (slot, &(idx, _)) in order.iter().enumerate() {
        let y = spacing.mul_add(as_f64(slot), block_center - half_block);
        ys[idx.index()] = if graph.children_of(idx).len() > 2 {
            y.mul_add(1.0 - bias, center * bias)
        } else {
            y
        };
    }
}

/// Fan-out-weighted mean y of placed parents, or the center with none.
fn desired_y(
    graph: &BraidGraph,
    idx: NodeIndex,
    placed: &FixedBitSet,
    ys: &[f64],
    center: f64,
) -> f64 {
    let (sum, weight) = graph
        .parents_of(idx)
        .iter()
        .filter(|p| placed.contains(p.index()))
        .fold((0.0, 0.0), |(sum, weight), p| {
            let fan = as_f64(graph.children_of(*p).len().max(1));
            (ys[p.index()].mul_add(fan, sum), weight + fan)
        });
    if weight > 0.0 { sum / weight } else { center }
}

#[allow(clippy::cast_possible_truncation)]
fn bucket(y: f64, tolerance: f64) -> i64 {
    (y / tolerance).round() as i64
}

/// Push beads apart to at least `min_spacing`, then fit the cohort back
/// into the padded canvas, compressing if it is taller than the canvas.
fn resolve_overlaps(members: &[NodeIndex], ys: &mut [f64], min_spacing: f64, canvas: &Canvas) {
    let mut order = members.to_vec();
    order.sort_by(|a, b| ys[a.index()].total_cmp(&ys[b.index()]).then(a.cmp(b)));
    order.dedup();
    let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
        return;
    };

    for pair in order.windows(2) {
        let floor = ys[pair[0].index()] + min_spacing;
        let cur = &mut ys[pair[1].index()];
        if *cur < floor {
            *cur = floor;
        }
    }

    let (lo, hi) = (ys[first.index()], ys[last.index()]);
    let (top, bottom) = (canvas.top(), canvas.bottom());
    let spread = hi - lo;

    if spread > bottom - top {
        let scale = (bottom - top) / spread;
        for m in &order {
            ys[m.index()] = (ys[m.index()] - lo).mul_add(scale, top);
        }
    } else {
        let shift = if hi > bottom {
            bottom - hi
        } else if lo < top {
            top - lo
        } else {
            0.0
        };
        for m in &order {
            ys[m.index()] += shift;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
