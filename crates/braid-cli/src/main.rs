#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "braid: cohort, highest-work path and layout analysis for share braids",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (`pretty` on a TTY, `text` when piped).
    #[arg(long, global = true, value_enum, value_name = "FORMAT")]
    format: Option<OutputMode>,

    /// Alias for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags and the environment.
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Analysis",
        about = "Run the pipeline and print the render-ready view",
        long_about = "Ingest a braid fixture, partition it into cohorts, select the \
                      highest-work path and lay it out. JSON output is the view payload \
                      a front end draws from.",
        after_help = "EXAMPLES:\n    # Print the view for a fixture\n    braid render braid.json --format json\n\n    # Grid layout on a small canvas\n    braid render braid.json --mode grid --width 640 --height 480\n\n    # Read the fixture from stdin\n    braid synth diamonds --count 5 | braid render -"
    )]
    Render(cmd::render::RenderArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Show graph statistics and ingestion diagnostics",
        after_help = "EXAMPLES:\n    # Summarize a fixture\n    braid stats braid.json\n\n    # Machine-readable statistics\n    braid stats braid.json --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Show the highest-work path",
        after_help = "EXAMPLES:\n    # Greedy path (default)\n    braid path braid.json\n\n    # Path with the largest summed work\n    braid path braid.json --path-strategy cumulative"
    )]
    Path(cmd::path::PathArgs),

    #[command(
        next_help_heading = "Fixtures",
        about = "Generate a synthetic braid fixture",
        after_help = "EXAMPLES:\n    # 1,000-bead random braid\n    braid synth random --count 1000 --seed 42 -o braid.json\n\n    # Truncated chain of diamonds with dangling parents\n    braid synth diamonds --count 50 --window 40"
    )]
    Synth(cmd::synth::SynthArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BRAID_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "braid=debug,braid_core=debug,info"
        } else {
            "braid=info,braid_core=warn,warn"
        })
    });

    let format = env::var("BRAID_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr so stdout stays a clean payload.
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();

    let command_result = match cli.command {
        Commands::Render(ref args) => cmd::render::run_render(args, output),
        Commands::Stats(ref args) => cmd::stats::run_stats(args, output),
        Commands::Path(ref args) => cmd::path::run_path(args, output),
        Commands::Synth(ref args) => cmd::synth::run_synth(args, output),
    };

    match command_result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            render_error(output, &CliError::from_anyhow(&err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_core::{LayoutMode, LayoutParams, PathStrategy};
    use braid_sim::SynthKind;

    #[test]
    fn render_flags_parse() {
        let cli = Cli::parse_from([
            "braid",
            "render",
            "braid.json",
            "--mode",
            "refined",
            "--width",
            "640",
            "--zoom",
            "0.5",
            "--path-strategy",
            "cumulative",
        ]);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.analyze.file.to_str(), Some("braid.json"));
        assert_eq!(args.analyze.mode, Some(LayoutMode::ExternalRefined));
        assert_eq!(args.analyze.width, Some(640.0));
        assert_eq!(args.analyze.zoom, Some(0.5));
        assert_eq!(args.analyze.path_strategy, Some(PathStrategy::Cumulative));
        assert!(args.analyze.height.is_none());
    }

    #[test]
    fn format_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["braid", "stats", "braid.json", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["braid", "--json", "path", "braid.json"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn synth_defaults() {
        let cli = Cli::parse_from(["braid", "synth", "diamonds"]);
        let Commands::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.kind, SynthKind::Diamonds);
        assert_eq!(args.count, 100);
        assert_eq!(args.seed, 0);
        assert!(args.window.is_none());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = Cli::try_parse_from(["braid", "render", "braid.json", "--mode", "spiral"])
            .expect_err("unknown mode");
        assert!(err.to_string().contains("spiral"));
    }

    #[test]
    fn zoom_help_matches_engine_clamp() {
        use clap::CommandFactory;

        let cli = Cli::command();
        let render = cli.find_subcommand("render").expect("render subcommand");
        let zoom = render
            .get_arguments()
            .find(|a| a.get_id() == "zoom")
            .expect("--zoom flag");
        let help = zoom.get_help().map(ToString::to_string).unwrap_or_default();
        assert!(
            help.contains(&format!("[{}, 1]", braid_core::layout::MIN_ZOOM)),
            "help: {help}"
        );

        let params = LayoutParams {
            zoom: 0.0,
            ..LayoutParams::default()
        }
        .sanitized();
        assert!((params.zoom - braid_core::layout::MIN_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["braid", "path", "braid.json", "-v"]);
        assert!(cli.verbose);
    }
}
