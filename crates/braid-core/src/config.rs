use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BraidError;
use crate::layout::LayoutParams;
use crate::path::PathStrategy;

/// Engine tunables, loaded from TOML.
///
/// ```toml
/// [layout]
/// mode = "columnar"
/// width = 1600
/// zoom = 0.8
///
/// [path]
/// strategy = "cumulative"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub layout: LayoutParams,
    #[serde(default)]
    pub path: PathConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default)]
    pub strategy: PathStrategy,
}

/// Parse a config file. A missing file yields the defaults.
///
/// # Errors
///
/// [`BraidError::Io`] if the file exists but cannot be read,
/// [`BraidError::Config`] if it is not valid TOML for [`EngineConfig`].
pub fn load_config(path: &Path) -> Result<EngineConfig, BraidError> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    read_config(path)
}

/// Parse a config file that must exist.
///
/// # Errors
///
/// As [`load_config`], plus [`BraidError::Io`] when the file is missing.
pub fn read_config(path: &Path) -> Result<EngineConfig, BraidError> {
    let content = std::fs::read_to_string(path).map_err(|source| BraidError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

fn parse_config(content: &str, path: &Path) -> Result<EngineConfig, BraidError> {
    toml::from_str::<EngineConfig>(content).map_err(|e| BraidError::Config {
        path: path.to_path_buf(),
        reason: e.message().to_string(),
    })
}

/// Location of the per-user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("braid/config.toml"))
}

/// Load `<config dir>/braid/config.toml`, or the defaults when absent.
///
/// # Errors
///
/// As [`load_config`].
pub fn load_user_config() -> Result<EngineConfig, BraidError> {
    let Some(path) = user_config_path() else {
        return Ok(EngineConfig::default());
    };
    load_config(&path)
}

/// An explicit `--config` file wins over the user config.
///
/// # Errors
///
/// An explicit file that is missing or invalid is an error; so is an
/// invalid user config.
pub fn resolve_config(explicit: Option<&Path>) -> Result<EngineConfig, BraidError> {
    match explicit {
        Some(path) => read_config(path),
        None => load_user_config(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::layout::LayoutMode;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = load_config(&dir.path().join("absent.toml")).expect("load should succeed");
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.path.strategy, PathStrategy::Greedy);
        assert_eq!(cfg.layout.mode, LayoutMode::Columnar);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("config.toml");
        std::fs::write(
            &file,
            r#"
[layout]
mode = "grid"
width = 640

[path]
strategy = "cumulative"
"#,
        )
        .expect("write config");

        let cfg = load_config(&file).expect("parse");
        assert_eq!(cfg.layout.mode, LayoutMode::Grid);
        assert!((cfg.layout.width - 640.0).abs() < f64::EPSILON);
        assert!((cfg.layout.height - LayoutParams::default().height).abs() < f64::EPSILON);
        assert_eq!(cfg.path.strategy, PathStrategy::Cumulative);
    }

    #[test]
    fn refined_alias_is_accepted() {
        let cfg = parse_config("[layout]\nmode = \"refined\"\n", Path::new("inline"))
            .expect("parse");
        assert_eq!(cfg.layout.mode, LayoutMode::ExternalRefined);
    }

    #[test]
    fn invalid_config_is_a_config_error() {
        let err = parse_config("[path]\nstrategy = \"fastest\"\n", Path::new("bad.toml"))
            .expect_err("unknown strategy");
        assert_eq!(err.code(), ErrorCode::ConfigParseError);
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.toml");
        let err = resolve_config(Some(&missing)).expect_err("must exist");
        assert_eq!(err.code(), ErrorCode::SourceUnreadable);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut cfg = EngineConfig::default();
        cfg.layout.zoom = 0.5;
        cfg.path.strategy = PathStrategy::Cumulative;
        let text = toml::to_string(&cfg).expect("serialize");
        assert_eq!(parse_config(&text, Path::new("rt")).expect("parse"), cfg);
    }
}
