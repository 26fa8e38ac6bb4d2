//! Seeded pseudo-random generator shared across a benchmark sweep.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Deterministic random stream.
///
/// One generator is created per run and threaded explicitly through every
/// consumer, so the order of draws fully determines the values produced.
#[derive(Debug, Clone)]
pub struct Generator {
    seed: u64,
    rng: StdRng,
}

impl Generator {
    pub fn manual_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restart the stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Seed the stream was last (re)started from.
    pub fn initial_seed(&self) -> u64 {
        self.seed
    }

    /// Uniform sample in `[0, 1)`.
    pub fn uniform(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform integer in `[low, high)`. Requires `low < high`.
    pub fn randint(&mut self, low: i64, high: i64) -> i64 {
        self.rng.gen_range(low..high)
    }

    /// Random permutation of `0..n`.
    pub fn randperm(&mut self, n: usize) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..n).collect();
        perm.shuffle(&mut self.rng);
        perm
    }

    /// Underlying rng, for sampling from `rand_distr` distributions.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
