//! Adam with bias-corrected moments.

use strokeforge_config::OptimizerConfig;

use super::Optimizer;

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step_count: i32,
    first_moment: Vec<f64>,
    second_moment: Vec<f64>,
}

impl Adam {
    pub fn new(config: &OptimizerConfig, len: usize) -> Self {
        Self {
            learning_rate: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
            step_count: 0,
            first_moment: vec![0.0; len],
            second_moment: vec![0.0; len],
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [f64], grads: &[f64]) {
        self.step_count += 1;
        let correction1 = 1.0 - self.beta1.powi(self.step_count);
        let correction2 = 1.0 - self.beta2.powi(self.step_count);

        for (((p, g), m), v) in params
            .iter_mut()
            .zip(grads)
            .zip(&mut self.first_moment)
            .zip(&mut self.second_moment)
        {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}
