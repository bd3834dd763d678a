//! Injectable, seedable randomness.
//!
//! The evolution engine's tournament selection, mutation/crossover choice,
//! and initial-population fill, plus the router's jitter calculation, all
//! draw from a `RandomSource` instead of `rand::thread_rng()` directly so a
//! whole run can be replayed bit-for-bit from a seed.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Seedable source of randomness shared across threads.
pub trait RandomSource: Send + Sync {
    /// Uniform float in `range`.
    fn gen_range_f64(&self, range: Range<f64>) -> f64;

    /// Uniform integer in `[0, bound)`. Panics if `bound == 0`.
    fn gen_below(&self, bound: usize) -> usize;

    /// `true` with probability `p` (clamped to `[0.0, 1.0]`).
    fn gen_bool(&self, p: f64) -> bool;

    /// Draw `count` distinct indices from `[0, len)` without replacement.
    /// Panics if `count > len`.
    fn sample_indices(&self, len: usize, count: usize) -> Vec<usize>;
}

/// `StdRng`-backed implementation seeded at construction.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seed from the system's entropy source; runs using this are not
    /// reproducible, which is fine for `generate()` but must not be used
    /// for `evolve()` when determinism is required.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl RandomSource for SeededRandom {
    fn gen_range_f64(&self, range: Range<f64>) -> f64 {
        let mut rng = self.rng.lock();
        rng.gen_range(range)
    }

    fn gen_below(&self, bound: usize) -> usize {
        assert!(bound > 0, "gen_below called with bound == 0");
        let mut rng = self.rng.lock();
        rng.gen_range(0..bound)
    }

    fn gen_bool(&self, p: f64) -> bool {
        let mut rng = self.rng.lock();
        rng.gen_bool(p.clamp(0.0, 1.0))
    }

    fn sample_indices(&self, len: usize, count: usize) -> Vec<usize> {
        assert!(count <= len, "sample_indices: count exceeds len");
        let mut rng = self.rng.lock();
        rand::seq::index::sample(&mut *rng, len, count).into_vec()
    }
}
