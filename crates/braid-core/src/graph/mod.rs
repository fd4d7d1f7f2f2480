//! Braid graph model.
//!
//! # Overview
//!
//! This module normalizes raw parent/child adjacency into a [`BraidGraph`]:
//! one [`Bead`] per id in the union of both maps' keys, with every list
//! filtered down to beads that actually exist, plus a petgraph `DiGraph` over
//! the union edge set.
//!
//! ## Pipeline
//!
//! ```text
//! RawBraid (typed maps from ingest)
//!        ↓  build::BraidGraph::from_raw()
//! BraidGraph (filtered adjacency, O(1) lookup, content hash)
//!        ↓  cohort::partition()
//! Partition
//!        ↓  stats::GraphStats::from_graph()
//! GraphStats (roots, tips, components, fallback cohorts, …)
//! ```
//!
//! ## Typical Usage
//!
//! ```rust
//! use braid_core::graph::{BraidGraph, GraphStats};
//! use braid_core::ingest::RawBraid;
//! use braid_core::cohort::partition;
//!
//! let raw = RawBraid::from_json_str(
//!     r#"{ "parents": { "2": [1] }, "children": { "1": [2] } }"#,
//! )?;
//! let graph = BraidGraph::from_raw(&raw);
//! let stats = GraphStats::from_graph(&graph, &partition(&graph));
//! assert_eq!(stats.bead_count, 2);
//! # Ok::<(), braid_core::BraidError>(())
//! ```

pub mod build;
pub mod stats;

// Re-export primary types at module level for convenience.
pub use build::{Bead, BraidGraph, GraphDiagnostics};
pub use stats::GraphStats;
