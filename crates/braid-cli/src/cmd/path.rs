//! `braid path`: the highest-work path from root to tip.

use std::io::{self, Write};

use braid_core::HighWorkPath;
use clap::Args;

use super::AnalyzeArgs;
use crate::output::{OutputMode, fmt_num, pretty_kv, pretty_section, render_mode};

/// Arguments for `braid path`.
#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Execute `braid path`.
pub fn run_path(args: &PathArgs, output: OutputMode) -> anyhow::Result<()> {
    let analysis = args.analyze.analyze()?;
    tracing::debug!(
        beads = analysis.view.path.len(),
        total_work = analysis.view.path.total_work,
        "selected path"
    );
    render_mode(output, &analysis.view.path, render_path_text, render_path_human)
}

/// One bead id per line, root first.
fn render_path_text(path: &HighWorkPath, w: &mut dyn Write) -> io::Result<()> {
    for id in &path.beads {
        writeln!(w, "{id}")?;
    }
    Ok(())
}

fn render_path_human(path: &HighWorkPath, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Highest-work path")?;
    if path.is_empty() {
        writeln!(w, "(no tips: empty braid)")?;
        return Ok(());
    }
    pretty_kv(w, "Beads", path.len().to_string())?;
    pretty_kv(w, "Total work", fmt_num(path.total_work))?;
    if let Some(tip) = path.tip() {
        pretty_kv(w, "Tip", tip.to_string())?;
    }
    let chain: Vec<String> = path.beads.iter().map(ToString::to_string).collect();
    writeln!(w)?;
    writeln!(w, "{}", chain.join(" -> "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_core::Pipeline;

    fn diamond_path() -> HighWorkPath {
        Pipeline::default()
            .run_json(
                r#"{
                    "parents":  { "1": [], "2": [1], "3": [1], "4": [2, 3] },
                    "children": { "1": [2, 3], "2": [4], "3": [4], "4": [] },
                    "work": { "3": 5 }
                }"#,
            )
            .expect("valid payload")
            .view
            .path
    }

    #[test]
    fn text_is_one_id_per_line() {
        let mut buf = Vec::new();
        render_path_text(&diamond_path(), &mut buf).expect("render");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "1\n3\n4\n");
    }

    #[test]
    fn pretty_shows_chain_and_tip() {
        let mut buf = Vec::new();
        render_path_human(&diamond_path(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("1 -> 3 -> 4"));
        assert!(text.contains("Tip:"));
    }

    #[test]
    fn pretty_empty_path() {
        let mut buf = Vec::new();
        render_path_human(&HighWorkPath::empty(), &mut buf).expect("render");
        assert!(String::from_utf8(buf).expect("utf8").contains("empty braid"));
    }
}
