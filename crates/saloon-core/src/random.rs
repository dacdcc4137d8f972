//! Random number sources.
//!
//! Every stochastic decision in the games goes through [`RandomSource`] so
//! tests can replace the generator with a fixed script.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces bounded pseudo-random integers.
pub trait RandomSource: Send {
    /// A uniform integer in `low..=high`. Callers guarantee `low <= high`.
    fn between(&mut self, low: u32, high: u32) -> u32;

    /// A fair coin flip.
    fn coin(&mut self) -> bool {
        self.between(0, 1) == 1
    }

    /// A uniform index into a collection of `len` elements, `None` when empty.
    fn index(&mut self, len: usize) -> Option<usize> {
        let last = u32::try_from(len.checked_sub(1)?).unwrap_or(u32::MAX);
        Some(self.between(0, last) as usize)
    }
}

/// [`RandomSource`] backed by a seedable standard RNG.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Deterministic source for a given seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn between(&mut self, low: u32, high: u32) -> u32 {
        self.rng.random_range(low..=high)
    }
}

/// [`RandomSource`] that replays a fixed list of values.
///
/// Each draw takes the next scripted value clamped into the requested
/// range; an exhausted script yields `low`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    script: VecDeque<u32>,
}

impl ScriptedRandom {
    /// Replay `values` in order.
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: values.into_iter().collect(),
        }
    }

    /// Scripted values not yet drawn.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn between(&mut self, low: u32, high: u32) -> u32 {
        self.script
            .pop_front()
            .map_or(low, |v| v.clamp(low, high))
    }
}
