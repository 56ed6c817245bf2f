//! StrokeForge Raster
//!
//! Renders Bezier strokes into anti-aliased intensity fields and
//! back-propagates intensity gradients to the stroke parameters.
//!
//! Every candidate curve is sampled at `M` parameters; each pixel's
//! intensity depends only on its distance to the nearest sample point:
//!
//! ```text
//! I = clamp(1 − (d / width + ε)^aa_factor, 0, 1)
//! ```
//!
//! Nearest-sample distance is an approximation of the true distance to the
//! curve. Its error shrinks as `M` grows; `M` is the knob that trades
//! render cost for fidelity. Points, lines and higher-degree curves all go
//! through the same path (a point is a degree-0 curve).

pub mod rasterizer;

pub use rasterizer::{
    CurveRasterizer, RenderedBatch, RenderedStroke, StrokeGradient, StrokeStyle, EPSILON,
};
