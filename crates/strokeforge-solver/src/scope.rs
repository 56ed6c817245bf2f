//! Search-level scope.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Mutable state shared by every step of one search.
///
/// Owns the random source (grid seeding and truncation sides both draw
/// from it), the step counter and the clock that terminations inspect.
#[derive(Debug)]
pub struct SearchScope {
    rng: ChaCha8Rng,
    start_time: Option<Instant>,
    total_step_count: u64,
}

impl SearchScope {
    /// A scope seeded from the operating system.
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_os_rng())
    }

    /// A reproducible scope.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Seeded when `seed` is given, otherwise from the operating system.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::with_seed)
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            start_time: None,
            total_step_count: 0,
        }
    }

    pub fn start_search(&mut self) {
        self.start_time = Some(Instant::now());
        self.total_step_count = 0;
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn increment_step_count(&mut self) -> u64 {
        self.total_step_count += 1;
        self.total_step_count
    }

    pub fn total_step_count(&self) -> u64 {
        self.total_step_count
    }
}

impl Default for SearchScope {
    fn default() -> Self {
        Self::new()
    }
}
