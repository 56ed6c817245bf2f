//! Search configuration fixtures.

use strokeforge_config::SearchConfig;

/// Default knobs with a fixed seed.
pub fn seeded_config(seed: u64) -> SearchConfig {
    SearchConfig::new().with_random_seed(seed)
}

/// A small, fast, seeded search: 2x2 grid and 10 steps.
pub fn quick_config(seed: u64) -> SearchConfig {
    SearchConfig::new()
        .with_grid_size(2)
        .with_steps(10)
        .with_random_seed(seed)
}
