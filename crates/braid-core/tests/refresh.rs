//! Refresh coordinator against on-disk fixtures.

use std::sync::Arc;

use braid_core::{
    BeadId, EngineConfig, FixtureSource, Pipeline, RefreshCoordinator, RefreshOutcome,
};
use braid_sim::{linear_chain, window};

fn write(path: &std::path::Path, json: &str) {
    std::fs::write(path, json).expect("write fixture");
}

#[test]
fn fixture_growth_is_published_incrementally() {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = dir.path().join("braid.json");
    let source = FixtureSource::new(&file);
    let coord = RefreshCoordinator::new(Pipeline::new(EngineConfig::default()));

    write(&file, &linear_chain(5).to_json().to_string());
    let first = coord.refresh(&source);
    assert_eq!(first.snapshot().expect("published").view.nodes.len(), 5);

    // Identity refresh.
    let again = coord.refresh(&source);
    let (RefreshOutcome::Published(a), RefreshOutcome::Unchanged(b)) = (&first, &again) else {
        panic!("expected Published then Unchanged");
    };
    assert!(Arc::ptr_eq(a, b));

    // Two more beads arrive.
    write(&file, &linear_chain(7).to_json().to_string());
    let grown = coord.refresh(&source);
    let snap = grown.snapshot().expect("published");
    assert_eq!(snap.generation, 2);
    assert_eq!(
        snap.new_beads.iter().cloned().collect::<Vec<_>>(),
        vec![BeadId::from(6), BeadId::from(7)]
    );
}

#[test]
fn sliding_window_reports_only_arrivals() {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = dir.path().join("braid.json");
    let source = FixtureSource::new(&file);
    let coord = RefreshCoordinator::new(Pipeline::default());

    let full = linear_chain(30);
    write(&file, &window(&linear_chain(20), 10).to_json().to_string());
    let _ = coord.refresh(&source);

    write(&file, &window(&full, 10).to_json().to_string());
    let outcome = coord.refresh(&source);
    let snap = outcome.snapshot().expect("published");
    assert_eq!(snap.view.nodes.len(), 10);
    assert_eq!(snap.new_beads.len(), 10, "window 21..=30 shares nothing with 11..=20");
}

#[test]
fn unreadable_or_malformed_fixture_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = dir.path().join("braid.json");
    let source = FixtureSource::new(&file);
    let coord = RefreshCoordinator::new(Pipeline::default());

    assert!(matches!(coord.refresh(&source), RefreshOutcome::Failed(_)), "missing file");
    assert!(coord.current().is_none());

    write(&file, &linear_chain(3).to_json().to_string());
    let published = coord.refresh(&source);
    let before = Arc::clone(published.snapshot().expect("published"));

    write(&file, r#"{ "parents": 3 }"#);
    match coord.refresh(&source) {
        RefreshOutcome::Failed(err) => assert_eq!(err.code().code(), "E1001"),
        other => panic!("expected Failed, got {other:?}"),
    }
    let current = coord.current().expect("still published");
    assert!(Arc::ptr_eq(&before, &current));
}
