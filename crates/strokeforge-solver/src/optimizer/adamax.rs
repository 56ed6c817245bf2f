//! Adamax: Adam with an infinity-norm second moment.
//!
//! The step size per coordinate is bounded by the learning rate, which
//! keeps control points moving at a steady pace regardless of how steep
//! the score surface is.

use strokeforge_config::OptimizerConfig;

use super::Optimizer;

#[derive(Debug, Clone)]
pub struct Adamax {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step_count: i32,
    first_moment: Vec<f64>,
    infinity_norm: Vec<f64>,
}

impl Adamax {
    pub fn new(config: &OptimizerConfig, len: usize) -> Self {
        Self {
            learning_rate: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
            step_count: 0,
            first_moment: vec![0.0; len],
            infinity_norm: vec![0.0; len],
        }
    }
}

impl Optimizer for Adamax {
    fn step(&mut self, params: &mut [f64], grads: &[f64]) {
        self.step_count += 1;
        let step_size = self.learning_rate / (1.0 - self.beta1.powi(self.step_count));

        for (((p, g), m), u) in params
            .iter_mut()
            .zip(grads)
            .zip(&mut self.first_moment)
            .zip(&mut self.infinity_norm)
        {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *u = (self.beta2 * *u).max(g.abs() + self.epsilon);
            *p -= step_size * *m / *u;
        }
    }

    fn name(&self) -> &'static str {
        "adamax"
    }
}
