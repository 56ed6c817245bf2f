//! Frozen classifiers with known preferences.

use strokeforge_core::CanvasShape;
use strokeforge_scoring::LinearSoftmaxModel;

/// Class scored by [`corner_model`] for ink near the top-left corner.
pub const CORNER_CLASS: usize = 0;

/// Two-class model whose class 0 rewards ink near pixel (0, 0).
///
/// Class 0 weights decay with distance from the corner; a negative bias
/// keeps a blank canvas at a low class 0 probability so gradients are
/// not saturated at the start of a search.
pub fn corner_model(shape: CanvasShape) -> LinearSoftmaxModel {
    LinearSoftmaxModel::from_fn(shape, 2, |class, y, x| {
        if class == CORNER_CLASS {
            let d = ((x * x + y * y) as f64).sqrt();
            0.05 * (-d / 20.0).exp()
        } else {
            0.0
        }
    })
    .and_then(|model| model.with_biases(vec![-2.0, 0.0]))
    .expect("corner model parameters are consistent")
}

/// Two-class model whose class 0 rewards ink anywhere.
pub fn ink_model(shape: CanvasShape) -> LinearSoftmaxModel {
    LinearSoftmaxModel::from_fn(shape, 2, |class, _, _| if class == 0 { 0.02 } else { 0.0 })
        .and_then(|model| model.with_biases(vec![-1.0, 0.0]))
        .expect("ink model parameters are consistent")
}

/// Model with all-zero weights: every class has probability `1 / class_count`.
pub fn indifferent_model(shape: CanvasShape, class_count: usize) -> LinearSoftmaxModel {
    LinearSoftmaxModel::from_fn(shape, class_count, |_, _, _| 0.0)
        .expect("zero weights are consistent")
}
