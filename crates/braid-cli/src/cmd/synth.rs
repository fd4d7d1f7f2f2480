//! `braid synth`: emit a synthetic fixture.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use braid_sim::{SimBraid, SynthKind, one_sided, synthesize, window};
use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `braid synth`.
#[derive(Args, Debug, Clone)]
pub struct SynthArgs {
    /// Generator family (`chain`, `diamonds`, `random`).
    #[arg(value_name = "KIND")]
    pub kind: SynthKind,

    /// Beads for `chain`/`random`, diamonds for `diamonds`.
    #[arg(long, default_value_t = 100)]
    pub count: u64,

    /// RNG seed for `random`.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Keep only the newest N beads, leaving references to dropped beads dangling.
    #[arg(long, value_name = "N")]
    pub window: Option<usize>,

    /// Drop every Nth child-side link declaration.
    #[arg(long, value_name = "N")]
    pub one_sided: Option<usize>,

    /// Write the fixture to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Summary printed when the fixture goes to a file.
#[derive(Debug, Serialize)]
struct SynthSummary {
    path: PathBuf,
    kind: String,
    beads: usize,
    links: usize,
}

/// Build the fixture described by `args`.
pub fn build_fixture(args: &SynthArgs) -> anyhow::Result<SimBraid> {
    let mut braid = synthesize(args.kind, args.count, args.seed)
        .with_context(|| format!("failed to generate {} braid", args.kind))?;
    if let Some(keep) = args.window {
        braid = window(&braid, keep);
    }
    if let Some(every) = args.one_sided {
        braid = one_sided(&braid, every);
    }
    Ok(braid)
}

/// Execute `braid synth`.
pub fn run_synth(args: &SynthArgs, output: OutputMode) -> anyhow::Result<()> {
    let braid = build_fixture(args)?;
    let json = braid.to_json_pretty();

    let Some(ref path) = args.output else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{json}")?;
        return Ok(());
    };

    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write fixture to {}", path.display()))?;
    let summary = SynthSummary {
        path: path.clone(),
        kind: args.kind.to_string(),
        beads: braid.bead_count(),
        links: braid.link_count(),
    };
    render_mode(output, &summary, render_summary_text, render_summary_human)
}

fn render_summary_text(summary: &SynthSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        summary.path.display(),
        summary.kind,
        summary.beads,
        summary.links
    )
}

fn render_summary_human(summary: &SynthSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Synthetic fixture")?;
    pretty_kv(w, "File", summary.path.display().to_string())?;
    pretty_kv(w, "Kind", &summary.kind)?;
    pretty_kv(w, "Beads", summary.beads.to_string())?;
    pretty_kv(w, "Links", summary.links.to_string())
}
