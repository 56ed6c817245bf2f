//! StrokeForge Core
//!
//! Geometry and canvas primitives shared by every StrokeForge crate:
//! - [`Point`] and the numeric helpers behind Bernstein blending
//! - [`BezierCurve`], the polynomial curve model with its arc-length table
//! - [`Canvas`], the fixed-shape scalar field strokes are rendered onto
//! - [`StrokeForgeError`], the error type surfaced at crate boundaries

pub mod canvas;
pub mod curve;
pub mod error;
pub mod geometry;

pub use canvas::{Canvas, CanvasShape};
pub use curve::{BezierCurve, ControlPoints, SampleMode, TruncateSide};
pub use error::{Result, StrokeForgeError};
pub use geometry::{bernstein, bernstein_weights, binomial, lerp, uniform_parameters, Point};
