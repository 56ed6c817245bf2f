//! Tests for the optimizers.

use strokeforge_config::{OptimizerConfig, OptimizerKind};

use super::*;

/// Minimizes `Σ (p_i - c_i)²` and returns the final parameters.
fn minimize(kind: OptimizerKind, learning_rate: f64, steps: usize) -> Vec<f64> {
    let target = [3.0, -2.0, 0.5];
    let mut params = vec![0.0; 3];
    let mut optimizer = build_optimizer(&OptimizerConfig::new(kind, learning_rate), 3);
    for _ in 0..steps {
        let grads: Vec<f64> = params
            .iter()
            .zip(&target)
            .map(|(p, c)| 2.0 * (p - c))
            .collect();
        optimizer.step(&mut params, &grads);
    }
    params
}

fn assert_near_target(params: &[f64], tol: f64) {
    for (p, c) in params.iter().zip([3.0, -2.0, 0.5]) {
        assert!((p - c).abs() < tol, "{params:?}");
    }
}

#[test]
fn test_sgd_converges() {
    assert_near_target(&minimize(OptimizerKind::Sgd, 0.1, 200), 1e-6);
}

#[test]
fn test_adam_converges() {
    assert_near_target(&minimize(OptimizerKind::Adam, 0.05, 2000), 1e-2);
}

#[test]
fn test_adamax_converges() {
    assert_near_target(&minimize(OptimizerKind::Adamax, 0.05, 2000), 1e-2);
}

#[test]
fn test_sgd_step() {
    let mut optimizer = Sgd::new(0.5);
    let mut params = vec![1.0, 1.0];
    optimizer.step(&mut params, &[2.0, -2.0]);
    assert_eq!(params, vec![0.0, 2.0]);
}

#[test]
fn test_adamax_first_step_is_bounded_by_learning_rate() {
    let config = OptimizerConfig::new(OptimizerKind::Adamax, 0.03);
    let mut optimizer = Adamax::new(&config, 3);
    let mut params = vec![0.0; 3];
    optimizer.step(&mut params, &[1000.0, -0.001, 0.0]);
    // m / u = (1 - β1) g / |g| on the first step; bias correction undoes (1 - β1).
    assert!((params[0] + 0.03).abs() < 1e-9);
    assert!((params[1] - 0.03).abs() < 1e-4);
    assert_eq!(params[2], 0.0);
}

#[test]
fn test_coordinates_are_independent() {
    let config = OptimizerConfig::new(OptimizerKind::Adam, 0.1);
    let mut joint = Adam::new(&config, 2);
    let mut alone = Adam::new(&config, 1);
    let mut joint_params = vec![0.0, 0.0];
    let mut alone_params = vec![0.0];
    for step in 0..5 {
        let g = step as f64 - 2.0;
        joint.step(&mut joint_params, &[g, 10.0]);
        alone.step(&mut alone_params, &[g]);
    }
    assert_eq!(joint_params[0], alone_params[0]);
}

#[test]
fn test_names() {
    for (kind, name) in [
        (OptimizerKind::Sgd, "sgd"),
        (OptimizerKind::Adam, "adam"),
        (OptimizerKind::Adamax, "adamax"),
    ] {
        let optimizer = build_optimizer(&OptimizerConfig::new(kind, 0.1), 1);
        assert_eq!(optimizer.name(), name);
    }
}
