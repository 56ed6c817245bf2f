//! First-order optimizers over a flat parameter vector.
//!
//! Every optimizer updates each coordinate independently, so a batch of
//! candidates can share one optimizer over their concatenated control
//! points without the candidates influencing each other.

mod adam;
mod adamax;
mod sgd;

use std::fmt::Debug;

use strokeforge_config::{OptimizerConfig, OptimizerKind};

pub use adam::Adam;
pub use adamax::Adamax;
pub use sgd::Sgd;

/// A gradient-descent update rule.
pub trait Optimizer: Send + Debug {
    /// Moves `params` against `grads`. Both slices have the length the
    /// optimizer was built for.
    fn step(&mut self, params: &mut [f64], grads: &[f64]);

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// Builds the optimizer `config` describes for `len` parameters.
pub fn build_optimizer(config: &OptimizerConfig, len: usize) -> Box<dyn Optimizer> {
    match config.kind {
        OptimizerKind::Sgd => Box::new(Sgd::new(config.learning_rate)),
        OptimizerKind::Adam => Box::new(Adam::new(config, len)),
        OptimizerKind::Adamax => Box::new(Adamax::new(config, len)),
    }
}

#[cfg(test)]
mod tests;
