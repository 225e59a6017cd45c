// ClipForge Random Sources
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Segment boundaries and asset picks are uniform random draws. The draw
// itself is injected so runs can be replayed exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// A source of uniform random draws.
pub trait RandomSource: Send {
    /// Integer drawn uniformly from `[low, high]` (inclusive).
    fn uniform_int(&mut self, low: u32, high: u32) -> u32;

    /// Real drawn uniformly from `[low, high]`.
    fn uniform_f64(&mut self, low: f64, high: f64) -> f64;

    /// Index drawn uniformly from `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// `RandomSource` backed by any `rand` generator.
pub struct RngSource<R: Rng + Send> {
    rng: R,
}

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn uniform_f64(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed script of unit draws (each in `[0, 1]`).
///
/// Every call consumes one value and maps it linearly onto the requested
/// range, so `0.0` always yields the lowest outcome and `1.0` the highest.
/// Once the script is exhausted every draw yields the lowest outcome.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    script: VecDeque<f64>,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: script.into_iter().map(|u| u.clamp(0.0, 1.0)).collect(),
        }
    }

    fn next_unit(&mut self) -> f64 {
        self.script.pop_front().unwrap_or(0.0)
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        let u = self.next_unit();
        if low >= high {
            return low;
        }
        let span = (high - low) as f64 + 1.0;
        let offset = (u * span).floor().min(span - 1.0) as u32;
        low + offset
    }

    fn uniform_f64(&mut self, low: f64, high: f64) -> f64 {
        let u = self.next_unit();
        if low >= high {
            return low;
        }
        low + u * (high - low)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        let u = self.next_unit();
        if len <= 1 {
            return 0;
        }
        ((u * len as f64).floor() as usize).min(len - 1)
    }
}

/// Hands each render its own private random source.
///
/// Batch windows never share a generator, so a window's draws depend only
/// on its index.
pub trait RandomFactory: Send + Sync {
    fn for_window(&self, index: usize) -> Box<dyn RandomSource>;
}

/// Fresh entropy per window, or a fixed seed mixed with the window index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    Entropy,
    Fixed(u64),
}

impl SeedPolicy {
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or(SeedPolicy::Entropy, SeedPolicy::Fixed)
    }
}

impl RandomFactory for SeedPolicy {
    fn for_window(&self, index: usize) -> Box<dyn RandomSource> {
        match self {
            SeedPolicy::Entropy => Box::new(RngSource::from_entropy()),
            SeedPolicy::Fixed(seed) => {
                // splitmix-style stride keeps neighbouring windows decorrelated
                let mixed = seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                Box::new(RngSource::seeded(mixed))
            }
        }
    }
}

impl<F> RandomFactory for F
where
    F: Fn(usize) -> Box<dyn RandomSource> + Send + Sync,
{
    fn for_window(&self, index: usize) -> Box<dyn RandomSource> {
        self(index)
    }
}
