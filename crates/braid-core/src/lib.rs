#![forbid(unsafe_code)]
//! braid-core library: cohort partitioning, highest-work path selection and
//! layout for share braids.
//!
//! # Conventions
//!
//! - **Errors**: Fallible boundaries return `Result<_, BraidError>`. Analysis
//!   stages past ingestion never fail.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`). Stages
//!   are `#[instrument]`ed; fallbacks log at `warn`, diagnostics at `debug`.
//! - **Determinism**: Beads are stored in ascending id order and every
//!   tie-break picks the smallest id.
//!
//! # Quick start
//!
//! ```rust
//! use braid_core::{EngineConfig, Pipeline};
//!
//! let analysis = Pipeline::new(EngineConfig::default()).run_json(
//!     r#"{ "parents": { "1": [], "2": [1] }, "children": { "1": [2] } }"#,
//! )?;
//! assert_eq!(analysis.view.cohorts.len(), 2);
//! # Ok::<(), braid_core::BraidError>(())
//! ```

pub mod cohort;
pub mod config;
pub mod error;
pub mod graph;
pub mod id;
pub mod ingest;
pub mod layout;
pub mod path;
pub mod pipeline;
pub mod refresh;
pub mod view;

pub use cohort::{Cohort, Partition, accept_precomputed, partition};
pub use config::{EngineConfig, PathConfig};
pub use error::{BraidError, ErrorCode};
pub use graph::{Bead, BraidGraph, GraphDiagnostics, GraphStats};
pub use id::BeadId;
pub use ingest::{AdjacencyMap, RawBraid, WorkMap};
pub use layout::{LayoutMode, LayoutParams, Position, Positions, layout};
pub use path::{HighWorkPath, PathStrategy, select_path, select_path_with};
pub use pipeline::{Analysis, Pipeline};
pub use refresh::{
    BraidSource, FixtureSource, RefreshCoordinator, RefreshOutcome, Snapshot, StaticSource,
};
pub use view::{BraidView, ViewLink, ViewNode};
