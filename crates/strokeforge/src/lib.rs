//! StrokeForge - differentiable stroke synthesis in Rust
//!
//! Finds the pen stroke that most raises a frozen classifier's probability
//! for a target class: candidate Bezier curves are rendered with a
//! differentiable rasterizer, scored, and refined by projected gradient
//! descent from a grid of starting points.
//!
//! # Example
//!
//! ```rust
//! use strokeforge::prelude::*;
//!
//! let shape = CanvasShape::square(16);
//! let mut model = LinearSoftmaxModel::from_fn(shape, 2, |class, y, x| {
//!     if class == 0 && x + y < 8 { 0.1 } else { 0.0 }
//! }).unwrap();
//!
//! let config = SearchConfig::new().with_grid_size(2).with_steps(5).with_random_seed(7);
//! let search = MultiStartSearch::new(config, shape).unwrap();
//! let base = Canvas::new(shape);
//! let result = search.run(&mut model, StrokeRequest::new(&base, 0, 8.0)).unwrap();
//!
//! let polyline = result.polyline(20, 20).unwrap();
//! assert!(polyline.iter().all(|p| p.is_in_unit_square()));
//! ```

pub use strokeforge_core::{
    BezierCurve, Canvas, CanvasShape, Point, Result, SampleMode, StrokeForgeError, TruncateSide,
};

pub use strokeforge_scoring::{
    mse_loss, softmax, LinearModelParams, LinearSoftmaxModel, ModelOutput, ScoreGradient,
    ScoreModel,
};

pub use strokeforge_raster::{CurveRasterizer, RenderedBatch, StrokeGradient, StrokeStyle};

pub use strokeforge_config::{
    ConfigError, OptimizerConfig, OptimizerKind, SampleMethod, SearchConfig, SelectionPolicy,
    ServiceConfig, TerminationConfig,
};

pub use strokeforge_solver::{
    CancellationToken, ConstrainedStrokeOptimizer, MultiStartSearch, SearchProgress,
    SearchResult, SearchStatistics, StrokeCandidate, StrokeRequest,
};

pub use strokeforge_service::{
    DirectoryModelLoader, FnModelLoader, FoundStroke, InferenceService, LabelPair, ModelLoader,
    StrokeQuery,
};

pub use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

#[cfg(feature = "console")]
pub mod console;

/// A channel for per-step [`SearchProgress`] snapshots.
///
/// Pass the sender to
/// [`InferenceService::find_stroke_with_progress`] or
/// [`MultiStartSearch::run_with_channel`].
pub fn progress_channel() -> (UnboundedSender<SearchProgress>, UnboundedReceiver<SearchProgress>) {
    tokio::sync::mpsc::unbounded_channel()
}

pub mod prelude {
    pub use super::{
        Canvas, CanvasShape, LinearSoftmaxModel, MultiStartSearch, Point, ScoreModel,
        SearchConfig, StrokeRequest,
    };
    pub use super::{InferenceService, LabelPair, ServiceConfig, StrokeQuery};
    pub use super::{CancellationToken, SearchProgress, SearchResult};
}
