//! Objective helpers.

/// Loss value and its gradient with respect to each score.
#[derive(Debug, Clone, PartialEq)]
pub struct LossGradient {
    pub loss: f64,
    pub score_gradients: Vec<f64>,
}

/// Mean squared error of `scores` against a constant `target`.
///
/// The search pulls every candidate's score towards 1.0, so the gradient
/// for candidate `i` is `2 (s_i - target) / n`.
pub fn mse_loss(scores: &[f64], target: f64) -> LossGradient {
    if scores.is_empty() {
        return LossGradient {
            loss: 0.0,
            score_gradients: Vec::new(),
        };
    }
    let n = scores.len() as f64;
    let loss = scores.iter().map(|s| (s - target).powi(2)).sum::<f64>() / n;
    let score_gradients = scores.iter().map(|s| 2.0 * (s - target) / n).collect();
    LossGradient {
        loss,
        score_gradients,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse_loss() {
        let result = mse_loss(&[0.5, 1.0], 1.0);
        assert!((result.loss - 0.125).abs() < 1e-12);
        assert_eq!(result.score_gradients, vec![-0.5, 0.0]);
    }

    #[test]
    fn test_mse_loss_empty() {
        let result = mse_loss(&[], 1.0);
        assert_eq!(result.loss, 0.0);
        assert!(result.score_gradients.is_empty());
    }
}
