//! Canvas fixtures.

use strokeforge_core::{Canvas, CanvasShape};

/// An all-zero canvas.
pub fn blank_canvas(shape: CanvasShape) -> Canvas {
    Canvas::new(shape)
}

/// A canvas with every pixel set to `value` (clamped into `[0, 1]`).
pub fn filled_canvas(shape: CanvasShape, value: f64) -> Canvas {
    Canvas::from_fn(shape, |_, _| value)
}
