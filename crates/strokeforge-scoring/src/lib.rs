//! StrokeForge Scoring
//!
//! The differentiable classifier seam of the stroke search:
//! - [`ScoreModel`] - forward pass plus the analytic gradient of one class
//!   probability with respect to the input canvas
//! - [`LinearSoftmaxModel`] - per-class pixel weights followed by softmax
//! - [`loss`] - objective helpers used by the optimizer

pub mod linear;
pub mod loss;
pub mod model;

pub use linear::{LinearModelParams, LinearSoftmaxModel};
pub use loss::{mse_loss, LossGradient};
pub use model::{softmax, ModelOutput, ScoreGradient, ScoreModel};
