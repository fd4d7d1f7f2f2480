//! E2E CLI tests for `braid synth` and feeding its output back through the
//! analysis commands.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn braid_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("braid"));
    cmd.current_dir(dir);
    cmd.env("BRAID_LOG", "error");
    cmd.env_remove("BRAID_FORMAT");
    cmd.env("XDG_CONFIG_HOME", dir);
    cmd.env("HOME", dir);
    cmd
}

fn synth_stdout(dir: &Path, args: &[&str]) -> Value {
    let output = braid_cmd(dir)
        .arg("synth")
        .args(args)
        .output()
        .expect("braid should not crash");
    assert!(
        output.status.success(),
        "synth {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("fixture is JSON")
}

#[test]
fn synth_prints_a_fixture() {
    let dir = TempDir::new().expect("temp dir");
    let fixture = synth_stdout(dir.path(), &["chain", "--count", "4"]);
    assert_eq!(fixture["parents"]["4"], serde_json::json!([3]));
    assert_eq!(fixture["children"]["1"], serde_json::json!([2]));
}

#[test]
fn synth_random_is_reproducible() {
    let dir = TempDir::new().expect("temp dir");
    let args = ["random", "--count", "60", "--seed", "9"];
    assert_eq!(synth_stdout(dir.path(), &args), synth_stdout(dir.path(), &args));
}

#[test]
fn synth_rejects_unknown_kind() {
    let dir = TempDir::new().expect("temp dir");
    braid_cmd(dir.path())
        .args(["synth", "spiral"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown braid kind"));
}

#[test]
fn synth_to_file_then_analyze() {
    let dir = TempDir::new().expect("temp dir");
    braid_cmd(dir.path())
        .args(["synth", "diamonds", "--count", "10", "-o", "d.json", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("d.json\tdiamonds\t31\t"));

    let output = braid_cmd(dir.path())
        .args(["stats", "d.json", "--json"])
        .output()
        .expect("braid should not crash");
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(stats["bead_count"], 31);
    assert_eq!(stats["cohort_count"], 21);
    assert_eq!(stats["fallback_cohorts"], 0);
}

#[test]
fn windowed_synth_analyzes_with_dangling_refs() {
    let dir = TempDir::new().expect("temp dir");
    braid_cmd(dir.path())
        .args(["synth", "diamonds", "--count", "10", "--window", "12", "-o", "w.json"])
        .assert()
        .success();

    let output = braid_cmd(dir.path())
        .args(["stats", "w.json", "--json"])
        .output()
        .expect("braid should not crash");
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(stats["bead_count"], 12);
    assert!(stats["diagnostics"]["dangling_refs"].as_u64() > Some(0));
}

#[test]
fn synth_pipes_into_render() {
    let dir = TempDir::new().expect("temp dir");
    let fixture = braid_cmd(dir.path())
        .args(["synth", "chain", "--count", "5"])
        .output()
        .expect("braid should not crash");
    assert!(fixture.status.success());

    let output = braid_cmd(dir.path())
        .args(["render", "-", "--json"])
        .write_stdin(fixture.stdout)
        .output()
        .expect("braid should not crash");
    assert!(output.status.success());
    let view: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(view["path"]["beads"], serde_json::json!([1, 2, 3, 4, 5]));
}
