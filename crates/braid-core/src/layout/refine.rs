//! Vertical refinement for [`LayoutMode::ExternalRefined`].
//!
//! The refiner only moves beads vertically: columns are fixed by the
//! columnar pass and handed over read-only. Whatever the refiner returns is
//! checked for length and finiteness, then clamped into `[0, height]`.
//!
//! [`LayoutMode::ExternalRefined`]: super::LayoutMode::ExternalRefined

use std::collections::BTreeMap;

use super::{Canvas, LayoutError, LayoutParams, Position};
use crate::graph::BraidGraph;

/// Everything a refiner sees. Indices are node indices in id order.
#[derive(Debug, Clone, Copy)]
pub struct RefineInput<'a> {
    pub xs: &'a [f64],
    /// Starting y from the columnar pass.
    pub ys: &'a [f64],
    /// `(parent, child)` index pairs.
    pub edges: &'a [(usize, usize)],
    pub height: f64,
    pub iterations: usize,
}

/// A vertical position optimizer.
///
/// Must return one y per bead. Anything else makes the layout fall back to
/// the grid.
pub trait PositionRefiner: Send + Sync {
    fn refine(&self, input: &RefineInput<'_>) -> Vec<f64>;
}

/// Deterministic spring/repulsion relaxation.
///
/// Links pull their endpoints toward the same height, neighbours within a
/// column push apart when closer than `repulsion_range`, and a weak
/// gravity keeps the whole picture near the vertical center. Per-step
/// movement is capped by `max_step`, which decays by `cooling` each
/// iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringRefiner {
    pub spring: f64,
    pub repulsion: f64,
    pub repulsion_range: f64,
    pub gravity: f64,
    pub max_step: f64,
    pub cooling: f64,
}

impl Default for SpringRefiner {
    fn default() -> Self {
        Self {
            spring: 0.08,
            repulsion: 0.5,
            repulsion_range: 40.0,
            gravity: 0.01,
            max_step: 20.0,
            cooling: 0.95,
        }
    }
}

impl PositionRefiner for SpringRefiner {
    fn refine(&self, input: &RefineInput<'_>) -> Vec<f64> {
        let n = input.ys.len();
        let mut ys = input.ys.to_vec();
        let center = input.height / 2.0;

        // Beads sharing a column, keyed by the column's x bits.
        let mut columns: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (i, x) in input.xs.iter().enumerate().take(n) {
            columns.entry(x.to_bits()).or_default().push(i);
        }

        let mut forces = vec![0.0; n];
        let mut step = self.max_step;
        for _ in 0..input.iterations {
            forces.fill(0.0);

            for &(a, b) in input.edges {
                if a >= n || b >= n {
                    continue;
                }
                let pull = self.spring * (ys[b] - ys[a]);
                forces[a] += pull;
                forces[b] -= pull;
            }

            for members in columns.values_mut() {
                members.sort_by(|&i, &j| ys[i].total_cmp(&ys[j]).then(i.cmp(&j)));
                for pair in members.windows(2) {
                    let gap = ys[pair[1]] - ys[pair[0]];
                    if gap < self.repulsion_range {
                        let push = self.repulsion * (self.repulsion_range - gap);
                        forces[pair[0]] -= push;
                        forces[pair[1]] += push;
                    }
                }
            }

            for (y, f) in ys.iter_mut().zip(&forces) {
                let total = self.gravity.mul_add(center - *y, *f);
                *y += total.clamp(-step, step);
            }
            step *= self.cooling;
        }
        ys
    }
}

pub(super) fn apply(
    refiner: &dyn PositionRefiner,
    graph: &BraidGraph,
    initial: Vec<Position>,
    params: &LayoutParams,
    canvas: &Canvas,
) -> Result<Vec<Position>, LayoutError> {
    let xs: Vec<f64> = initial.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = initial.iter().map(|p| p.y).collect();
    let edges: Vec<(usize, usize)> = graph
        .links()
        .into_iter()
        .map(|(a, b)| (a.index(), b.index()))
        .collect();

    let refined = refiner.refine(&RefineInput {
        xs: &xs,
        ys: &ys,
        edges: &edges,
        height: canvas.height,
        iterations: params.refine_iterations,
    });
    if refined.len() != initial.len() {
        return Err(LayoutError::RefinerLength {
            expected: initial.len(),
            got: refined.len(),
        });
    }

    initial
        .into_iter()
        .zip(refined)
        .enumerate()
        .map(|(index, (pos, y))| {
            if y.is_finite() {
                Ok(Position {
                    x: pos.x,
                    y: y.clamp(0.0, canvas.height),
                })
            } else {
                Err(LayoutError::NonFinite { index })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_iterations_is_identity() {
        let ys = [10.0, 200.0, 35.0];
        let out = SpringRefiner::default().refine(&RefineInput {
            xs: &[0.0, 0.0, 50.0],
            ys: &ys,
            edges: &[(0, 2)],
            height: 300.0,
            iterations: 0,
        });
        assert_eq!(out, ys.to_vec());
    }

    #[test]
    fn link_pulls_endpoints_together() {
        let ys = [20.0, 280.0];
        let out = SpringRefiner::default().refine(&RefineInput {
            xs: &[0.0, 100.0],
            ys: &ys,
            edges: &[(0, 1)],
            height: 300.0,
            iterations: 30,
        });
        assert!((out[1] - out[0]).abs() < 260.0);
    }

    #[test]
    fn column_neighbours_push_apart() {
        let ys = [150.0, 151.0];
        let out = SpringRefiner::default().refine(&RefineInput {
            xs: &[10.0, 10.0],
            ys: &ys,
            edges: &[],
            height: 300.0,
            iterations: 10,
        });
        assert!(out[1] - out[0] > 1.0);
    }

    #[test]
    fn out_of_range_edges_are_ignored() {
        let out = SpringRefiner::default().refine(&RefineInput {
            xs: &[0.0],
            ys: &[5.0],
            edges: &[(0, 9)],
            height: 10.0,
            iterations: 5,
        });
        assert_eq!(out.len(), 1);
        assert!(out[0].is_finite());
    }
}
