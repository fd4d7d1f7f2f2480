//! Refresh coordination: fetch, recompute, publish.
//!
//! A [`RefreshCoordinator`] owns the most recently published [`Snapshot`]
//! and guarantees:
//!
//! - at most one refresh in flight; a concurrent call returns
//!   [`RefreshOutcome::Busy`] and touches nothing,
//! - a snapshot is published whole or not at all; a failed fetch leaves the
//!   previous snapshot current,
//! - an identity refresh (same content hash, same precomputed cohorts)
//!   keeps the previous snapshot and reports [`RefreshOutcome::Unchanged`].
//!
//! Data sources are injected per call through [`BraidSource`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, instrument, warn};

use crate::error::BraidError;
use crate::graph::{BraidGraph, GraphStats};
use crate::id::BeadId;
use crate::ingest::RawBraid;
use crate::pipeline::Pipeline;
use crate::view::BraidView;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Supplies raw adjacency on demand.
pub trait BraidSource: Send + Sync {
    /// Fetch the current window.
    ///
    /// # Errors
    ///
    /// Whatever the source cannot deliver: I/O, JSON or shape errors.
    fn fetch(&self) -> Result<RawBraid, BraidError>;
}

/// Reads a JSON fixture from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BraidSource for FixtureSource {
    fn fetch(&self) -> Result<RawBraid, BraidError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| BraidError::Io {
            path: self.path.clone(),
            source,
        })?;
        RawBraid::from_json_str(&text)
    }
}

/// An in-memory payload that can be swapped between fetches.
#[derive(Debug, Default)]
pub struct StaticSource {
    raw: Mutex<RawBraid>,
}

impl StaticSource {
    #[must_use]
    pub fn new(raw: RawBraid) -> Self {
        Self {
            raw: Mutex::new(raw),
        }
    }

    /// Replace the payload returned by later fetches.
    pub fn set(&self, raw: RawBraid) {
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = raw;
    }
}

impl BraidSource for StaticSource {
    fn fetch(&self) -> Result<RawBraid, BraidError> {
        Ok(self
            .raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A fully consistent published result.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// 1 for the first publication, +1 for each later one.
    pub generation: u64,
    pub view: BraidView,
    pub stats: GraphStats,
    /// Beads absent from the previous snapshot. Empty for the first one.
    pub new_beads: BTreeSet<BeadId>,
    /// Precomputed cohorts the source supplied, if any.
    pub source_cohorts: Option<Vec<Vec<BeadId>>>,
}

impl Snapshot {
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.view.content_hash
    }

    #[must_use]
    pub fn is_new(&self, id: &BeadId) -> bool {
        self.new_beads.contains(id)
    }
}

/// What a refresh call did.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A new snapshot is now current.
    Published(Arc<Snapshot>),
    /// The source content was identical; the previous snapshot stays.
    Unchanged(Arc<Snapshot>),
    /// Another refresh was in flight. Nothing changed.
    Busy,
    /// The fetch failed. The previous snapshot, if any, stays current.
    Failed(BraidError),
}

impl RefreshOutcome {
    /// The current snapshot after a `Published` or `Unchanged` outcome.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            Self::Published(s) | Self::Unchanged(s) => Some(s),
            Self::Busy | Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published(_))
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Serializes refreshes and owns the published snapshot.
#[derive(Debug)]
pub struct RefreshCoordinator {
    pipeline: Pipeline,
    current: Mutex<Option<Arc<Snapshot>>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when dropped, including on panic.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            current: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The currently published snapshot.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    /// Fetch from `source`, recompute and publish.
    #[instrument(skip_all)]
    pub fn refresh(&self, source: &dyn BraidSource) -> RefreshOutcome {
        let Some(_guard) = self.try_begin() else {
            debug!("refresh already in flight");
            return RefreshOutcome::Busy;
        };

        let raw = match source.fetch() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, code = %err.code(), "refresh failed; keeping previous snapshot");
                return RefreshOutcome::Failed(err);
            }
        };

        let previous = self.current();
        let graph = BraidGraph::from_raw(&raw);

        if let Some(prev) = &previous {
            if prev.content_hash() == graph.content_hash() && prev.source_cohorts == raw.cohorts {
                debug!(generation = prev.generation, "source unchanged");
                return RefreshOutcome::Unchanged(Arc::clone(prev));
            }
        }

        let analysis = self.pipeline.run_graph(&graph, raw.cohorts.as_deref());
        let new_beads = previous.as_ref().map_or_else(BTreeSet::new, |prev| {
            let before = prev.view.ids();
            analysis
                .view
                .nodes
                .iter()
                .filter(|n| !before.contains(&n.id))
                .map(|n| n.id.clone())
                .collect()
        });

        let snapshot = Arc::new(Snapshot {
            generation: previous.as_ref().map_or(1, |p| p.generation + 1),
            view: analysis.view,
            stats: analysis.stats,
            new_beads,
            source_cohorts: raw.cohorts,
        });

        info!(
            generation = snapshot.generation,
            beads = snapshot.stats.bead_count,
            new_beads = snapshot.new_beads.len(),
            "published snapshot"
        );
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snapshot));
        RefreshOutcome::Published(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn raw(json: &str) -> RawBraid {
        RawBraid::from_json_str(json).expect("valid payload")
    }

    const TWO: &str = r#"{ "parents": { "1": [], "2": [1] }, "children": { "1": [2] } }"#;
    const THREE: &str = r#"{
        "parents":  { "1": [], "2": [1], "3": [2] },
        "children": { "1": [2], "2": [3] }
    }"#;

    #[test]
    fn first_refresh_publishes_with_no_new_beads() {
        let coord = RefreshCoordinator::new(Pipeline::default());
        assert!(coord.current().is_none());

        let outcome = coord.refresh(&StaticSource::new(raw(TWO)));
        let snap = outcome.snapshot().expect("published");
        assert!(outcome.is_published());
        assert_eq!(snap.generation, 1);
        assert!(snap.new_beads.is_empty());
        assert_eq!(coord.current().as_deref(), Some(snap.as_ref()));
    }

    #[test]
    fn identity_refresh_is_unchanged() {
        let coord = RefreshCoordinator::new(Pipeline::default());
        let source = StaticSource::new(raw(TWO));
        let first = coord.refresh(&source);
        let second = coord.refresh(&source);

        let (RefreshOutcome::Published(a), RefreshOutcome::Unchanged(b)) = (&first, &second) else {
            panic!("expected Published then Unchanged, got {first:?} / {second:?}");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn growth_marks_new_beads_and_bumps_generation() {
        let coord = RefreshCoordinator::new(Pipeline::default());
        let source = StaticSource::new(raw(TWO));
        let _ = coord.refresh(&source);

        source.set(raw(THREE));
        let outcome = coord.refresh(&source);
        let snap = outcome.snapshot().expect("published");
        assert_eq!(snap.generation, 2);
        assert_eq!(snap.new_beads, BTreeSet::from([BeadId::from(3)]));
        assert!(snap.is_new(&BeadId::from(3)));
        assert!(!snap.is_new(&BeadId::from(1)));
    }

    #[test]
    fn changed_precomputed_cohorts_are_not_identity() {
        let coord = RefreshCoordinator::new(Pipeline::default());
        let source = StaticSource::new(raw(TWO));
        let _ = coord.refresh(&source);

        let mut with_cohorts = raw(TWO);
        with_cohorts.cohorts = Some(vec![vec![BeadId::from(1)], vec![BeadId::from(2)]]);
        source.set(with_cohorts);
        assert!(coord.refresh(&source).is_published());
    }

    struct Failing;

    impl BraidSource for Failing {
        fn fetch(&self) -> Result<RawBraid, BraidError> {
            Err(BraidError::malformed("$", "source offline"))
        }
    }

    #[test]
    fn failed_fetch_keeps_previous_snapshot() {
        let coord = RefreshCoordinator::new(Pipeline::default());
        let _ = coord.refresh(&StaticSource::new(raw(TWO)));
        let before = coord.current().expect("published");

        let outcome = coord.refresh(&Failing);
        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
        let after = coord.current().expect("still published");
        assert!(Arc::ptr_eq(&before, &after));
        assert!(!coord.is_refreshing(), "guard released after failure");
    }

    /// Blocks inside `fetch` until told to continue.
    struct Gated {
        entered: Mutex<Option<mpsc::Sender<()>>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl BraidSource for Gated {
        fn fetch(&self) -> Result<RawBraid, BraidError> {
            if let Some(tx) = self.entered.lock().expect("lock").take() {
                tx.send(()).expect("signal entered");
            }
            self.release.lock().expect("lock").recv().expect("release");
            Ok(raw(TWO))
        }
    }

    #[test]
    fn concurrent_refresh_is_busy() {
        let coord = Arc::new(RefreshCoordinator::new(Pipeline::default()));
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gated = Arc::new(Gated {
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
        });

        let worker = {
            let coord = Arc::clone(&coord);
            let gated = Arc::clone(&gated);
            thread::spawn(move || coord.refresh(gated.as_ref()).is_published())
        };

        entered_rx.recv().expect("worker entered fetch");
        assert!(coord.is_refreshing());
        assert!(matches!(
            coord.refresh(&StaticSource::new(raw(THREE))),
            RefreshOutcome::Busy
        ));
        assert!(coord.current().is_none(), "busy call published nothing");

        release_tx.send(()).expect("release worker");
        assert!(worker.join().expect("worker thread"));
        assert_eq!(coord.current().expect("published").generation, 1);
        assert!(!coord.is_refreshing());
    }
}
