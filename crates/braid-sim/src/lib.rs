#![forbid(unsafe_code)]
//! braid-sim library: deterministic synthetic braids.
//!
//! Generators emit [`SimBraid`], a plain adjacency value whose
//! [`SimBraid::to_json`] is the data-source payload format, so tests,
//! benchmarks and the CLI feed it through the same ingestion path as real
//! fixtures.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod braid;
pub mod generate;
pub mod strategy;
pub mod window;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

pub use braid::SimBraid;
pub use generate::{RandomBraidConfig, diamond_chain, linear_chain, random_braid};
pub use window::{one_sided, window};

/// Named generator families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthKind {
    /// [`linear_chain`] of `count` beads.
    Chain,
    /// [`diamond_chain`] of `count` diamonds.
    Diamonds,
    /// [`random_braid`] of `count` beads, default shape.
    Random,
}

impl fmt::Display for SynthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Chain => "chain",
            Self::Diamonds => "diamonds",
            Self::Random => "random",
        })
    }
}

impl FromStr for SynthKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chain" | "linear" => Ok(Self::Chain),
            "diamonds" | "diamond" => Ok(Self::Diamonds),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown braid kind '{other}'")),
        }
    }
}

/// Generate a braid of `kind`.
///
/// # Errors
///
/// Only [`SynthKind::Random`] can fail, on invalid configuration.
pub fn synthesize(kind: SynthKind, count: u64, seed: u64) -> Result<SimBraid> {
    match kind {
        SynthKind::Chain => Ok(linear_chain(count)),
        SynthKind::Diamonds => Ok(diamond_chain(count)),
        SynthKind::Random => random_braid(
            &RandomBraidConfig {
                beads: count,
                ..RandomBraidConfig::default()
            },
            seed,
        ),
    }
}
