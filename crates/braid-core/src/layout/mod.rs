//! Layout assignment: 2-D coordinates for every bead.
//!
//! # Modes
//!
//! - [`LayoutMode::Columnar`]: the braid layout. x is a function of cohort
//!   index alone; y follows fan-out-weighted parents (see [`columnar`]).
//! - [`LayoutMode::Grid`]: beads in id order on a rectangular grid, cohorts
//!   ignored. Also the fallback for every other mode.
//! - [`LayoutMode::ExternalRefined`]: columnar x held fixed, y handed to a
//!   [`PositionRefiner`] for a bounded number of iterations.
//!
//! # Guarantee
//!
//! [`layout`] returns exactly one finite [`Position`] per bead, inside
//! `[0, width] × [0, height]` or in the overflow column at
//! `x = width + overflow_gap`. It never fails: if the requested mode runs
//! into trouble (non-finite values, a partition from another graph, a
//! refiner returning the wrong number of values) the whole call falls back
//! to [`LayoutMode::Grid`] and logs a warning.

pub mod columnar;
mod grid;
pub mod refine;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::cohort::Partition;
use crate::graph::BraidGraph;
use crate::id::BeadId;

pub use columnar::descendant_counts;
pub use refine::{PositionRefiner, RefineInput, SpringRefiner};

/// Smallest zoom factor honoured; smaller values are clamped up.
pub const MIN_ZOOM: f64 = 0.05;

/// Upper bound on refinement iterations regardless of configuration.
pub const MAX_REFINE_ITERATIONS: usize = 10_000;

/// Coordinates within one layout call can differ from the canvas edge by
/// float noise; anything beyond this is a bug and triggers the fallback.
const BOUNDS_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which layout strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    Columnar,
    Grid,
    #[serde(alias = "refined")]
    ExternalRefined,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Columnar => "columnar",
            Self::Grid => "grid",
            Self::ExternalRefined => "external-refined",
        })
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "columnar" | "braid" => Ok(Self::Columnar),
            "grid" => Ok(Self::Grid),
            "external-refined" | "refined" => Ok(Self::ExternalRefined),
            other => Err(format!(
                "unknown layout mode '{other}'; use columnar, grid, or refined"
            )),
        }
    }
}

/// A bead's coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One position per bead id.
pub type Positions = BTreeMap<BeadId, Position>;

/// Canvas size and tunables for a layout call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    #[serde(default)]
    pub mode: LayoutMode,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Horizontal zoom, clamped to `[MIN_ZOOM, 1.0]`.
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// Margin kept clear on every side (capped at a quarter of the canvas).
    #[serde(default = "default_padding")]
    pub padding: f64,
    /// Minimum vertical gap between beads of one cohort.
    #[serde(default = "default_min_spacing")]
    pub min_spacing: f64,
    /// Preferred vertical gap between beads of one cohort.
    #[serde(default = "default_node_spacing")]
    pub node_spacing: f64,
    /// Desired-y values closer than this sort as equal.
    #[serde(default = "default_bucket_tolerance")]
    pub bucket_tolerance: f64,
    /// Pull of wide forks (more than two children) toward vertical center.
    #[serde(default = "default_center_bias")]
    pub center_bias: f64,
    /// Distance of the overflow column past the right edge.
    #[serde(default = "default_overflow_gap")]
    pub overflow_gap: f64,
    #[serde(default = "default_refine_iterations")]
    pub refine_iterations: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            width: default_width(),
            height: default_height(),
            zoom: default_zoom(),
            padding: default_padding(),
            min_spacing: default_min_spacing(),
            node_spacing: default_node_spacing(),
            bucket_tolerance: default_bucket_tolerance(),
            center_bias: default_center_bias(),
            overflow_gap: default_overflow_gap(),
            refine_iterations: default_refine_iterations(),
        }
    }
}

const fn default_width() -> f64 {
    1200.0
}

const fn default_height() -> f64 {
    800.0
}

const fn default_zoom() -> f64 {
    1.0
}

const fn default_padding() -> f64 {
    40.0
}

const fn default_min_spacing() -> f64 {
    24.0
}

const fn default_node_spacing() -> f64 {
    48.0
}

const fn default_bucket_tolerance() -> f64 {
    30.0
}

const fn default_center_bias() -> f64 {
    0.3
}

const fn default_overflow_gap() -> f64 {
    60.0
}

const fn default_refine_iterations() -> usize {
    50
}

impl LayoutParams {
    /// Params with the given canvas and mode, defaults elsewhere.
    #[must_use]
    pub fn new(width: f64, height: f64, zoom: f64, mode: LayoutMode) -> Self {
        Self {
            mode,
            width,
            height,
            zoom,
            ..Self::default()
        }
    }

    /// Replace unusable values: non-positive or non-finite canvas sides
    /// become 1.0, other tunables fall back to their defaults.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            mode: self.mode,
            width: positive_or(self.width, 1.0),
            height: positive_or(self.height, 1.0),
            zoom: if self.zoom.is_finite() {
                self.zoom.clamp(MIN_ZOOM, 1.0)
            } else {
                1.0
            },
            padding: non_negative_or(self.padding, 0.0),
            min_spacing: non_negative_or(self.min_spacing, d.min_spacing),
            node_spacing: non_negative_or(self.node_spacing, d.node_spacing),
            bucket_tolerance: positive_or(self.bucket_tolerance, d.bucket_tolerance),
            center_bias: if self.center_bias.is_finite() {
                self.center_bias.clamp(0.0, 1.0)
            } else {
                d.center_bias
            },
            overflow_gap: non_negative_or(self.overflow_gap, d.overflow_gap),
            refine_iterations: self.refine_iterations.min(MAX_REFINE_ITERATIONS),
        }
    }

    /// x coordinate of the overflow column.
    #[must_use]
    pub const fn overflow_x(&self) -> f64 {
        self.width + self.overflow_gap
    }
}

fn positive_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { fallback }
}

fn non_negative_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v >= 0.0 { v } else { fallback }
}

/// Internal failure of one layout mode. Never escapes [`layout`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("partition has no cohorts for a non-empty graph")]
    EmptyPartition,
    #[error("partition references bead index {index} outside the graph")]
    ForeignPartition { index: usize },
    #[error("bead index {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("bead index {index} at ({x}, {y}) lies outside the canvas")]
    OutOfBounds { index: usize, x: f64, y: f64 },
    #[error("refiner returned {got} coordinates for {expected} beads")]
    RefinerLength { expected: usize, got: usize },
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Drawable area derived from sanitized params.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Canvas {
    pub width: f64,
    pub height: f64,
    pub pad_x: f64,
    pub pad_y: f64,
    pub zoom: f64,
}

impl Canvas {
    fn new(params: &LayoutParams) -> Self {
        Self {
            width: params.width,
            height: params.height,
            pad_x: params.padding.min(params.width / 4.0),
            pad_y: params.padding.min(params.height / 4.0),
            zoom: params.zoom,
        }
    }

    pub const fn top(&self) -> f64 {
        self.pad_y
    }

    pub const fn bottom(&self) -> f64 {
        self.height - self.pad_y
    }

    pub const fn usable_height(&self) -> f64 {
        self.bottom() - self.top()
    }

    pub const fn center_y(&self) -> f64 {
        self.height / 2.0
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Lay out `graph` using the default [`SpringRefiner`] for refined mode.
#[must_use]
pub fn layout(graph: &BraidGraph, partition: &Partition, params: &LayoutParams) -> Positions {
    layout_with_refiner(graph, partition, params, &SpringRefiner::default())
}

/// Lay out `graph`, using `refiner` when the mode is
/// [`LayoutMode::ExternalRefined`].
#[must_use]
#[instrument(skip_all, fields(beads = graph.node_count(), mode = %params.mode))]
pub fn layout_with_refiner(
    graph: &BraidGraph,
    partition: &Partition,
    params: &LayoutParams,
    refiner: &dyn PositionRefiner,
) -> Positions {
    if graph.is_empty() {
        return Positions::new();
    }

    let params = params.sanitized();
    let canvas = Canvas::new(&params);

    let attempt = match params.mode {
        LayoutMode::Grid => Ok(grid::place(graph.node_count(), &canvas)),
        LayoutMode::Columnar => columnar::place(graph, partition, &params, &canvas),
        LayoutMode::ExternalRefined => columnar::place(graph, partition, &params, &canvas)
            .and_then(|initial| refine::apply(refiner, graph, initial, &params, &canvas)),
    }
    .and_then(|placed| validate(placed, &params));

    let placed = match attempt {
        Ok(placed) => placed,
        Err(err) => {
            warn!(%err, mode = %params.mode, "layout failed; falling back to grid");
            grid::place(graph.node_count(), &canvas)
        }
    };

    graph
        .beads()
        .zip(placed)
        .map(|(bead, pos)| (bead.id.clone(), pos))
        .collect()
}

/// Check finiteness and bounds, snapping float noise onto the canvas edge.
fn validate(mut placed: Vec<Position>, params: &LayoutParams) -> Result<Vec<Position>, LayoutError> {
    let overflow_x = params.overflow_x();
    let within = |v: f64, hi: f64| (-BOUNDS_EPSILON..=hi + BOUNDS_EPSILON).contains(&v);

    for (index, pos) in placed.iter_mut().enumerate() {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            return Err(LayoutError::NonFinite { index });
        }
        let in_overflow = (pos.x - overflow_x).abs() <= BOUNDS_EPSILON;
        if !(within(pos.x, params.width) || in_overflow) || !within(pos.y, params.height) {
            return Err(LayoutError::OutOfBounds {
                index,
                x: pos.x,
                y: pos.y,
            });
        }
        if in_overflow {
            pos.x = overflow_x;
        } else {
            pos.x = pos.x.clamp(0.0, params.width);
        }
        pos.y = pos.y.clamp(0.0, params.height);
    }
    Ok(placed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
