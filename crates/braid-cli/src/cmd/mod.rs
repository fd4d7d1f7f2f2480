pub mod path;
pub mod render;
pub mod stats;
pub mod synth;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use braid_core::config::resolve_config;
use braid_core::{
    Analysis, BraidSource, EngineConfig, FixtureSource, LayoutMode, PathStrategy, Pipeline,
    RawBraid,
};
use clap::Args;
use tracing::debug;

/// Fixture and engine overrides shared by the analysis commands.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Braid fixture: a JSON adjacency payload, or `-` for stdin.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Layout mode (`columnar`, `grid`, `refined`).
    #[arg(long, value_name = "MODE")]
    pub mode: Option<LayoutMode>,

    /// Canvas width.
    #[arg(long)]
    pub width: Option<f64>,

    /// Canvas height.
    #[arg(long)]
    pub height: Option<f64>,

    /// Horizontal zoom, clamped to [0.05, 1].
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Path strategy (`greedy`, `cumulative`).
    #[arg(long, value_name = "STRATEGY")]
    pub path_strategy: Option<PathStrategy>,

    /// Engine config file; defaults to the user config when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl AnalyzeArgs {
    /// Load the config file layer, then apply flag overrides on top.
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config =
            resolve_config(self.config.as_deref()).context("failed to load braid config")?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut EngineConfig) {
        if let Some(mode) = self.mode {
            config.layout.mode = mode;
        }
        if let Some(width) = self.width {
            config.layout.width = width;
        }
        if let Some(height) = self.height {
            config.layout.height = height;
        }
        if let Some(zoom) = self.zoom {
            config.layout.zoom = zoom;
        }
        if let Some(strategy) = self.path_strategy {
            config.path.strategy = strategy;
        }
    }

    /// Read the fixture and run the configured pipeline over it.
    pub fn analyze(&self) -> anyhow::Result<Analysis> {
        let config = self.engine_config()?;
        let raw = read_fixture(&self.file)?;
        debug!(
            file = %self.file.display(),
            mode = %config.layout.mode,
            strategy = %config.path.strategy,
            "running pipeline"
        );
        Ok(Pipeline::new(config).run(&raw))
    }
}

/// Read and validate a fixture from `path`, or stdin for `-`.
pub fn read_fixture(path: &Path) -> anyhow::Result<RawBraid> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read fixture from stdin")?;
        return RawBraid::from_json_str(&text).context("failed to parse fixture from stdin");
    }
    FixtureSource::new(path)
        .fetch()
        .with_context(|| format!("failed to load fixture {}", path.display()))
}
