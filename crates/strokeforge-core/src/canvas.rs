//! Fixed-shape scalar canvas.

use crate::error::{Result, StrokeForgeError};

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanvasShape {
    pub height: usize,
    pub width: usize,
}

impl CanvasShape {
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// A square canvas.
    pub const fn square(side: usize) -> Self {
        Self::new(side, side)
    }

    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }
}

/// A row-major 2D scalar field with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    shape: CanvasShape,
    data: Vec<f64>,
}

impl Canvas {
    /// A blank (all zero) canvas.
    pub fn new(shape: CanvasShape) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.pixel_count()],
        }
    }

    /// Wraps row-major pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::InvalidInput`] if the length does not match
    /// the shape or any value lies outside `[0, 1]`.
    pub fn from_vec(shape: CanvasShape, data: Vec<f64>) -> Result<Self> {
        if data.len() != shape.pixel_count() {
            return Err(StrokeForgeError::InvalidInput(format!(
                "canvas data has {} values, shape {}x{} needs {}",
                data.len(),
                shape.height,
                shape.width,
                shape.pixel_count()
            )));
        }
        if let Some(bad) = data.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(StrokeForgeError::InvalidInput(format!(
                "canvas value {bad} outside [0, 1]"
            )));
        }
        Ok(Self { shape, data })
    }

    /// Builds a canvas from a function of `(row, column)`, clamping into `[0, 1]`.
    pub fn from_fn(shape: CanvasShape, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(shape.pixel_count());
        for y in 0..shape.height {
            for x in 0..shape.width {
                data.push(f(y, x).clamp(0.0, 1.0));
            }
        }
        Self { shape, data }
    }

    pub fn shape(&self) -> CanvasShape {
        self.shape
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn get(&self, y: usize, x: usize) -> f64 {
        self.data[y * self.shape.width + x]
    }

    /// Sets a pixel, clamping into `[0, 1]`.
    pub fn set(&mut self, y: usize, x: usize, value: f64) {
        self.data[y * self.shape.width + x] = value.clamp(0.0, 1.0);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Adds `overlay` on top of this canvas, clamping each pixel at 1.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::InvalidInput`] on a shape mismatch.
    pub fn composite(&self, overlay: &[f64]) -> Result<Canvas> {
        if overlay.len() != self.data.len() {
            return Err(StrokeForgeError::InvalidInput(format!(
                "overlay has {} pixels, canvas has {}",
                overlay.len(),
                self.data.len()
            )));
        }
        let data = self
            .data
            .iter()
            .zip(overlay)
            .map(|(base, ink)| (base + ink).clamp(0.0, 1.0))
            .collect();
        Ok(Canvas {
            shape: self.shape,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_validates_length() {
        let shape = CanvasShape::new(2, 3);
        assert!(Canvas::from_vec(shape, vec![0.0; 5]).is_err());
        assert!(Canvas::from_vec(shape, vec![0.0; 6]).is_ok());
    }

    #[test]
    fn test_from_vec_validates_range() {
        let shape = CanvasShape::square(1);
        assert!(Canvas::from_vec(shape, vec![1.5]).is_err());
        assert!(Canvas::from_vec(shape, vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_row_major_indexing() {
        let canvas = Canvas::from_fn(CanvasShape::new(2, 3), |y, x| (y * 3 + x) as f64 / 10.0);
        assert_eq!(canvas.get(1, 2), 0.5);
        assert_eq!(canvas.as_slice()[4], 0.4);
    }

    #[test]
    fn test_composite_clamps() {
        let base = Canvas::from_fn(CanvasShape::square(2), |_, _| 0.75);
        let out = base.composite(&[0.0, 0.25, 0.5, 1.0]).unwrap();
        assert_eq!(out.as_slice(), &[0.75, 1.0, 1.0, 1.0]);
        assert!(base.composite(&[0.0]).is_err());
    }
}
