//! The score model trait.

use std::fmt::Debug;

use strokeforge_core::{Canvas, CanvasShape, Result, StrokeForgeError};

/// Output of one forward pass for a single canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    /// Unnormalized class scores (logits).
    pub raw_scores: Vec<f64>,
    /// Softmax of the raw scores; sums to 1 across classes.
    pub probabilities: Vec<f64>,
}

impl ModelOutput {
    /// Builds an output from raw scores, deriving the probabilities.
    pub fn from_raw_scores(raw_scores: Vec<f64>) -> Self {
        let probabilities = softmax(&raw_scores);
        Self {
            raw_scores,
            probabilities,
        }
    }

    /// Index of the most probable class.
    pub fn predicted_class(&self) -> Option<usize> {
        self.probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }
}

/// Probability of the target class and its gradient w.r.t. each pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGradient {
    pub score: f64,
    /// Row-major, same layout as the canvas.
    pub gradient: Vec<f64>,
}

/// A differentiable image classifier.
///
/// Methods take `&mut self`: implementations keep scratch buffers between
/// passes, so one instance must not run concurrent forward or backward
/// passes. Callers share a model behind a mutex.
pub trait ScoreModel: Send + Debug {
    /// Number of output classes.
    fn class_count(&self) -> usize;

    /// Shape of the canvases the model accepts.
    fn canvas_shape(&self) -> CanvasShape;

    /// Scores a batch of canvases.
    fn forward(&mut self, canvases: &[Canvas]) -> Result<Vec<ModelOutput>>;

    /// Probability of `target` for each canvas together with its input gradient.
    fn score_with_gradient(
        &mut self,
        canvases: &[Canvas],
        target: usize,
    ) -> Result<Vec<ScoreGradient>>;

    /// Checks a batch against the model's shape and class count.
    fn check_input(&self, canvases: &[Canvas], target: Option<usize>) -> Result<()> {
        let expected = self.canvas_shape();
        if let Some(canvas) = canvases.iter().find(|c| c.shape() != expected) {
            return Err(StrokeForgeError::InvalidInput(format!(
                "canvas is {}x{}, model expects {}x{}",
                canvas.height(),
                canvas.width(),
                expected.height,
                expected.width
            )));
        }
        if let Some(target) = target {
            if target >= self.class_count() {
                return Err(StrokeForgeError::InvalidInput(format!(
                    "target class {target} out of range for {} classes",
                    self.class_count()
                )));
            }
        }
        Ok(())
    }
}

/// Numerically stable softmax.
pub fn softmax(raw_scores: &[f64]) -> Vec<f64> {
    let max = raw_scores
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = raw_scores.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
