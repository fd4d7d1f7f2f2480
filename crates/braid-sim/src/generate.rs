//! Seeded braid generators.

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::braid::SimBraid;

/// `1 → 2 → … → len`, unit work.
#[must_use]
pub fn linear_chain(len: u64) -> SimBraid {
    let mut braid = SimBraid::default();
    for id in 1..=len {
        braid.add_bead(id, 1.0);
        if id > 1 {
            braid.link(id - 1, id);
        }
    }
    braid
}

/// A chain of `diamonds` diamonds sharing their end beads, unit work.
///
/// Diamond `d` is `b → b+1, b → b+2, b+1 → b+3, b+2 → b+3` with
/// `b = 3d + 1`, so there are `3 * diamonds + 1` beads and
/// `2 * diamonds + 1` cohorts.
#[must_use]
pub fn diamond_chain(diamonds: u64) -> SimBraid {
    let mut braid = SimBraid::default();
    braid.add_bead(1, 1.0);
    for d in 0..diamonds {
        let b = 3 * d + 1;
        for id in b + 1..=b + 3 {
            braid.add_bead(id, 1.0);
        }
        braid.link(b, b + 1);
        braid.link(b, b + 2);
        braid.link(b + 1, b + 3);
        braid.link(b + 2, b + 3);
    }
    braid
}

/// Parameters for [`random_braid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomBraidConfig {
    pub beads: u64,
    /// Upper bound on parents per bead.
    pub max_parents: usize,
    /// Parents are drawn from the `lookback` beads immediately before.
    pub lookback: u64,
    /// Chance (percent) of each extra parent beyond the first.
    pub merge_percent: u8,
    /// Chance (percent) that a bead starts a new root.
    pub root_percent: u8,
    pub min_work: f64,
    pub max_work: f64,
}

impl Default for RandomBraidConfig {
    fn default() -> Self {
        Self {
            beads: 200,
            max_parents: 3,
            lookback: 8,
            merge_percent: 35,
            root_percent: 2,
            min_work: 1.0,
            max_work: 10.0,
        }
    }
}

impl RandomBraidConfig {
    /// Validate configuration before generating.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.max_parents == 0 {
            bail!("max_parents must be > 0");
        }
        if self.lookback == 0 {
            bail!("lookback must be > 0");
        }
        if self.merge_percent > 100 || self.root_percent > 100 {
            bail!("percentages must be within 0..=100");
        }
        if !(self.min_work.is_finite() && self.max_work.is_finite())
            || self.min_work < 0.0
            || self.min_work > self.max_work
        {
            bail!(
                "work range {}..={} must be finite, non-negative and ordered",
                self.min_work,
                self.max_work
            );
        }
        Ok(())
    }
}

/// A random DAG: each bead links back to between one and `max_parents`
/// distinct beads among the `lookback` before it.
///
/// Same config and seed, same braid.
///
/// # Errors
///
/// Returns an error if the config does not validate.
pub fn random_braid(config: &RandomBraidConfig, seed: u64) -> Result<SimBraid> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut braid = SimBraid::default();

    for id in 1..=config.beads {
        let work = rng.gen_range(config.min_work..=config.max_work);
        braid.add_bead(id, work);
        if id == 1 || chance(&mut rng, config.root_percent) {
            continue;
        }

        let first = id.saturating_sub(config.lookback).max(1);
        let span = usize::try_from(id - first).unwrap_or(usize::MAX);
        let mut wanted = 1;
        while wanted < config.max_parents.min(span) && chance(&mut rng, config.merge_percent) {
            wanted += 1;
        }
        let mut picks: Vec<u64> = sample(&mut rng, span, wanted)
            .into_iter()
            .map(|offset| first + offset as u64)
            .collect();
        picks.sort_unstable();
        for parent in picks {
            braid.link(parent, id);
        }
    }

    debug!(
        seed,
        beads = braid.bead_count(),
        links = braid.link_count(),
        "generated random braid"
    );
    Ok(braid)
}

fn chance(rng: &mut StdRng, percent: u8) -> bool {
    percent > 0 && rng.gen_range(0..100u8) < percent
}
