//! Linear softmax classifier.
//!
//! Each class owns one weight per pixel plus a bias; the raw score of a
//! class is the weighted pixel sum and probabilities are the softmax of
//! the raw scores. The input gradient of class `c` is exact:
//!
//! ```text
//! ∂p_c/∂x = p_c · (W_c − Σ_k p_k W_k)
//! ```

use serde::{Deserialize, Serialize};
use strokeforge_core::{Canvas, CanvasShape, Result, StrokeForgeError};
use tracing::trace;

use crate::model::{softmax, ModelOutput, ScoreGradient, ScoreModel};

/// Serialized form of a [`LinearSoftmaxModel`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LinearModelParams {
    pub height: usize,
    pub width: usize,
    /// One row-major weight map per class.
    pub weights: Vec<Vec<f64>>,
    /// One bias per class.
    pub biases: Vec<f64>,
}

/// Per-pixel linear model followed by softmax.
///
/// # Example
///
/// ```
/// use strokeforge_core::{Canvas, CanvasShape};
/// use strokeforge_scoring::{LinearSoftmaxModel, ScoreModel};
///
/// let shape = CanvasShape::square(4);
/// // Class 0 likes ink anywhere, class 1 is indifferent.
/// let mut model = LinearSoftmaxModel::from_fn(shape, 2, |class, _, _| {
///     if class == 0 { 0.5 } else { 0.0 }
/// }).unwrap();
///
/// let blank = Canvas::new(shape);
/// let inked = Canvas::from_fn(shape, |_, _| 1.0);
/// let outputs = model.forward(&[blank, inked]).unwrap();
/// assert!(outputs[1].probabilities[0] > outputs[0].probabilities[0]);
/// ```
#[derive(Debug, Clone)]
pub struct LinearSoftmaxModel {
    shape: CanvasShape,
    class_count: usize,
    /// Class-major: `weights[c * pixels + i]`.
    weights: Vec<f64>,
    biases: Vec<f64>,
    mixed: Vec<f64>,
}

impl LinearSoftmaxModel {
    /// Builds a model from serialized parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::ModelLoad`] if the weight maps do not
    /// match the shape, the class counts disagree, or a value is not finite.
    pub fn new(params: LinearModelParams) -> Result<Self> {
        let shape = CanvasShape::new(params.height, params.width);
        let pixels = shape.pixel_count();
        let class_count = params.biases.len();

        if shape.is_empty() {
            return Err(StrokeForgeError::ModelLoad(
                "model canvas shape is empty".to_string(),
            ));
        }
        if class_count == 0 || params.weights.len() != class_count {
            return Err(StrokeForgeError::ModelLoad(format!(
                "{} weight maps for {} biases",
                params.weights.len(),
                class_count
            )));
        }
        if let Some((class, row)) = params
            .weights
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != pixels)
        {
            return Err(StrokeForgeError::ModelLoad(format!(
                "class {class} has {} weights, expected {pixels}",
                row.len()
            )));
        }

        let weights: Vec<f64> = params.weights.into_iter().flatten().collect();
        if weights.iter().chain(&params.biases).any(|v| !v.is_finite()) {
            return Err(StrokeForgeError::ModelLoad(
                "model parameters must be finite".to_string(),
            ));
        }

        Ok(Self {
            shape,
            class_count,
            weights,
            biases: params.biases,
            mixed: vec![0.0; pixels],
        })
    }

    /// Builds a model with zero biases from a weight function of `(class, row, column)`.
    pub fn from_fn(
        shape: CanvasShape,
        class_count: usize,
        weight: impl Fn(usize, usize, usize) -> f64,
    ) -> Result<Self> {
        let weights = (0..class_count)
            .map(|class| {
                (0..shape.height)
                    .flat_map(|y| (0..shape.width).map(move |x| (y, x)))
                    .map(|(y, x)| weight(class, y, x))
                    .collect()
            })
            .collect();
        Self::new(LinearModelParams {
            height: shape.height,
            width: shape.width,
            weights,
            biases: vec![0.0; class_count],
        })
    }

    /// Replaces the biases.
    pub fn with_biases(mut self, biases: Vec<f64>) -> Result<Self> {
        if biases.len() != self.class_count {
            return Err(StrokeForgeError::ModelLoad(format!(
                "{} biases for {} classes",
                biases.len(),
                self.class_count
            )));
        }
        self.biases = biases;
        Ok(self)
    }

    /// Serializable copy of the parameters.
    pub fn params(&self) -> LinearModelParams {
        let pixels = self.shape.pixel_count();
        LinearModelParams {
            height: self.shape.height,
            width: self.shape.width,
            weights: self.weights.chunks(pixels).map(<[f64]>::to_vec).collect(),
            biases: self.biases.clone(),
        }
    }

    fn class_weights(&self, class: usize) -> &[f64] {
        let pixels = self.shape.pixel_count();
        &self.weights[class * pixels..(class + 1) * pixels]
    }

    fn raw_scores(&self, canvas: &Canvas) -> Vec<f64> {
        (0..self.class_count)
            .map(|class| {
                let dot: f64 = self
                    .class_weights(class)
                    .iter()
                    .zip(canvas.as_slice())
                    .map(|(w, x)| w * x)
                    .sum();
                dot + self.biases[class]
            })
            .collect()
    }
}

impl ScoreModel for LinearSoftmaxModel {
    fn class_count(&self) -> usize {
        self.class_count
    }

    fn canvas_shape(&self) -> CanvasShape {
        self.shape
    }

    fn forward(&mut self, canvases: &[Canvas]) -> Result<Vec<ModelOutput>> {
        self.check_input(canvases, None)?;
        Ok(canvases
            .iter()
            .map(|canvas| ModelOutput::from_raw_scores(self.raw_scores(canvas)))
            .collect())
    }

    fn score_with_gradient(
        &mut self,
        canvases: &[Canvas],
        target: usize,
    ) -> Result<Vec<ScoreGradient>> {
        self.check_input(canvases, Some(target))?;
        let pixels = self.shape.pixel_count();
        let mut results = Vec::with_capacity(canvases.len());

        for canvas in canvases {
            let probabilities = softmax(&self.raw_scores(canvas));
            let p_target = probabilities[target];

            // mixed = Σ_k p_k W_k
            let mut mixed = std::mem::take(&mut self.mixed);
            mixed.clear();
            mixed.resize(pixels, 0.0);
            for (class, p) in probabilities.iter().enumerate() {
                for (m, w) in mixed.iter_mut().zip(self.class_weights(class)) {
                    *m += p * w;
                }
            }

            let gradient = self
                .class_weights(target)
                .iter()
                .zip(&mixed)
                .map(|(w, m)| p_target * (w - m))
                .collect();
            self.mixed = mixed;

            trace!(target_class = target, score = p_target, "linear model gradient");
            results.push(ScoreGradient {
                score: p_target,
                gradient,
            });
        }

        Ok(results)
    }
}
