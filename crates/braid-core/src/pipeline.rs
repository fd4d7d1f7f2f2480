//! One-call analysis: raw adjacency in, render-ready view out.
//!
//! ```text
//! RawBraid ─► BraidGraph ─► Partition ─┬─► HighWorkPath ─┐
//!                                      └─► Positions ────┴─► BraidView
//! ```
//!
//! The pipeline holds only configuration. Every run rebuilds the whole
//! result from the input, so runs are independent and deterministic.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::cohort::{Partition, accept_precomputed, partition};
use crate::config::EngineConfig;
use crate::error::BraidError;
use crate::graph::{BraidGraph, GraphStats};
use crate::id::BeadId;
use crate::ingest::RawBraid;
use crate::layout::{PositionRefiner, SpringRefiner, layout_with_refiner};
use crate::path::select_path_with;
use crate::view::BraidView;

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub view: BraidView,
    pub stats: GraphStats,
}

/// Configured analysis pipeline.
#[derive(Clone)]
pub struct Pipeline {
    config: EngineConfig,
    refiner: Arc<dyn PositionRefiner>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Pipeline {
    /// A pipeline using the default [`SpringRefiner`] for refined layouts.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            refiner: Arc::new(SpringRefiner::default()),
        }
    }

    /// Replace the refiner used by [`LayoutMode::ExternalRefined`].
    ///
    /// [`LayoutMode::ExternalRefined`]: crate::layout::LayoutMode::ExternalRefined
    #[must_use]
    pub fn with_refiner(mut self, refiner: Arc<dyn PositionRefiner>) -> Self {
        self.refiner = refiner;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every stage over `raw`.
    ///
    /// Never fails: malformed shapes are rejected earlier, at ingestion.
    #[must_use]
    pub fn run(&self, raw: &RawBraid) -> Analysis {
        let graph = BraidGraph::from_raw(raw);
        self.run_graph(&graph, raw.cohorts.as_deref())
    }

    /// Run the stages after graph construction.
    ///
    /// `cohorts` are the source's precomputed cohorts, used when they
    /// partition the graph exactly.
    #[must_use]
    #[instrument(skip_all, fields(beads = graph.node_count(), hash = %graph.content_hash()))]
    pub fn run_graph(&self, graph: &BraidGraph, cohorts: Option<&[Vec<BeadId>]>) -> Analysis {
        let partition = Self::partition_for(graph, cohorts);
        let path = select_path_with(
            graph,
            &graph.work_map(),
            self.config.path.strategy,
            &partition,
        );
        let positions =
            layout_with_refiner(graph, &partition, &self.config.layout, self.refiner.as_ref());
        let stats = GraphStats::from_graph(graph, &partition);

        debug!(
            beads = stats.bead_count,
            links = stats.link_count,
            cohorts = stats.cohort_count,
            fallback_cohorts = stats.fallback_cohorts,
            components = stats.component_count,
            path_len = path.len(),
            "pipeline run complete"
        );

        Analysis {
            view: BraidView::assemble(graph, &partition, &path, &positions),
            stats,
        }
    }

    /// Parse a JSON payload and run.
    ///
    /// # Errors
    ///
    /// [`BraidError::Json`] for invalid JSON and
    /// [`BraidError::MalformedInput`] for a payload of the wrong shape.
    pub fn run_json(&self, text: &str) -> Result<Analysis, BraidError> {
        let raw = RawBraid::from_json_str(text)?;
        Ok(self.run(&raw))
    }

    fn partition_for(graph: &BraidGraph, cohorts: Option<&[Vec<BeadId>]>) -> Partition {
        if let Some(given) = cohorts {
            if let Some(accepted) = accept_precomputed(graph, given) {
                debug!(cohorts = accepted.len(), "using precomputed cohorts");
                return accepted;
            }
            debug!("precomputed cohorts rejected; recomputing");
        }
        partition(graph)
    }
}
