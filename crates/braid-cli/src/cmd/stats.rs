//! `braid stats`: graph statistics and ingestion diagnostics.

use std::io::{self, Write};

use braid_core::GraphStats;
use clap::Args;
use serde::Serialize;

use super::AnalyzeArgs;
use crate::output::{OutputMode, fmt_num, pretty_kv, pretty_section, render_mode};

/// Arguments for `braid stats`.
#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Report payload for `braid stats`.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub content_hash: String,
    pub path_len: usize,
    pub path_work: f64,
    #[serde(flatten)]
    pub stats: GraphStats,
}

/// Execute `braid stats`.
pub fn run_stats(args: &StatsArgs, output: OutputMode) -> anyhow::Result<()> {
    let analysis = args.analyze.analyze()?;
    let report = StatsReport {
        content_hash: analysis.view.content_hash,
        path_len: analysis.view.path.len(),
        path_work: analysis.view.path.total_work,
        stats: analysis.stats,
    };
    render_mode(output, &report, render_stats_text, render_stats_human)
}

fn rows(report: &StatsReport) -> Vec<(&'static str, String)> {
    let s = &report.stats;
    vec![
        ("beads", s.bead_count.to_string()),
        ("links", s.link_count.to_string()),
        ("roots", s.root_count.to_string()),
        ("tips", s.tip_count.to_string()),
        ("density", format!("{:.4}", s.density)),
        ("components", s.component_count.to_string()),
        ("cyclic", s.cyclic.to_string()),
        ("cohorts", s.cohort_count.to_string()),
        ("widest_cohort", s.widest_cohort.to_string()),
        ("fallback_cohorts", s.fallback_cohorts.to_string()),
        ("max_parents", s.max_parents.to_string()),
        ("max_children", s.max_children.to_string()),
        ("path_len", report.path_len.to_string()),
        ("path_work", fmt_num(report.path_work)),
    ]
}

fn render_stats_text(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    for (key, value) in rows(report) {
        writeln!(w, "{key}\t{value}")?;
    }
    let d = &report.stats.diagnostics;
    writeln!(w, "dangling_refs\t{}", d.dangling_refs)?;
    writeln!(w, "self_refs\t{}", d.self_refs)?;
    writeln!(w, "duplicate_refs\t{}", d.duplicate_refs)?;
    writeln!(w, "asymmetric_links\t{}", d.asymmetric_links)?;
    writeln!(w, "content_hash\t{}", report.content_hash)
}

fn render_stats_human(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Braid stats")?;
    for (key, value) in rows(report) {
        pretty_kv(w, &key.replace('_', " "), value)?;
    }
    pretty_kv(w, "content hash", &report.content_hash)?;

    let d = &report.stats.diagnostics;
    writeln!(w)?;
    pretty_section(w, "Diagnostics")?;
    if d.is_clean() {
        writeln!(w, "clean: adjacency was fully consistent")?;
        return Ok(());
    }
    pretty_kv(w, "dangling refs", d.dangling_refs.to_string())?;
    pretty_kv(w, "self refs", d.self_refs.to_string())?;
    pretty_kv(w, "duplicate refs", d.duplicate_refs.to_string())?;
    pretty_kv(w, "one-sided links", d.asymmetric_links.to_string())
}
