//! `braid render`: run the full pipeline and print the render-ready view.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use braid_core::BraidView;
use clap::Args;

use super::AnalyzeArgs;
use crate::output::{OutputMode, fmt_num, pretty_kv, pretty_section, render_mode};

/// Arguments for `braid render`.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub analyze: AnalyzeArgs,

    /// Write the view JSON to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute `braid render`.
pub fn run_render(args: &RenderArgs, output: OutputMode) -> anyhow::Result<()> {
    let analysis = args.analyze.analyze()?;
    let view = &analysis.view;

    if let Some(ref path) = args.output {
        let json = serde_json::to_string_pretty(view)?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write view to {}", path.display()))?;
        tracing::info!(path = %path.display(), nodes = view.nodes.len(), "wrote view");
        return Ok(());
    }

    render_mode(output, view, render_view_text, render_view_pretty)
}

/// One row per bead: id, cohort, x, y and flags.
fn render_view_text(view: &BraidView, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "id\tcohort\tx\ty\twork\tflags")?;
    for node in &view.nodes {
        let cohort = node.cohort.map_or_else(|| "-".to_string(), |c| c.to_string());
        let mut flags = Vec::new();
        if node.is_root {
            flags.push("root");
        }
        if node.is_tip {
            flags.push("tip");
        }
        if node.on_path {
            flags.push("path");
        }
        writeln!(
            w,
            "{}\t{cohort}\t{:.1}\t{:.1}\t{}\t{}",
            node.id,
            node.x,
            node.y,
            fmt_num(node.work),
            flags.join(",")
        )?;
    }
    Ok(())
}

fn render_view_pretty(view: &BraidView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Braid view")?;
    pretty_kv(w, "Beads", view.nodes.len().to_string())?;
    pretty_kv(w, "Links", view.links.len().to_string())?;
    pretty_kv(w, "Cohorts", view.cohorts.len().to_string())?;
    pretty_kv(
        w,
        "Path",
        format!(
            "{} beads, work {}",
            view.path.len(),
            fmt_num(view.path.total_work)
        ),
    )?;
    pretty_kv(w, "Content hash", &view.content_hash)?;

    if view.cohorts.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    pretty_section(w, "Cohorts")?;
    for (index, cohort) in view.cohorts.iter().enumerate() {
        let members: Vec<String> = cohort
            .iter()
            .map(|id| {
                if view.path.contains(id) {
                    format!("*{id}")
                } else {
                    id.to_string()
                }
            })
            .collect();
        writeln!(w, "{index:>5}  {}", members.join(" "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_core::Pipeline;

    fn diamond() -> BraidView {
        Pipeline::default()
            .run_json(
                r#"{
                    "parents":  { "1": [], "2": [1], "3": [1], "4": [2, 3] },
                    "children": { "1": [2, 3], "2": [4], "3": [4], "4": [] }
                }"#,
            )
            .expect("valid payload")
            .view
    }

    #[test]
    fn text_rows_cover_every_bead() {
        let mut buf = Vec::new();
        render_view_text(&diamond(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("1\t0\t"));
        assert!(lines[1].ends_with("root,path"));
        assert!(lines[4].ends_with("tip,path"));
    }

    #[test]
    fn pretty_marks_path_members() {
        let mut buf = Vec::new();
        render_view_pretty(&diamond(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Cohorts:"));
        assert!(text.contains("    1  *2 3"));
    }

    #[test]
    fn pretty_empty_view_has_no_cohort_section() {
        let mut buf = Vec::new();
        render_view_pretty(&BraidView::default(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(!text.contains("\nCohorts\n"));
    }
}
