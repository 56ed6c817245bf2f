//! Search output.

use strokeforge_core::{
    uniform_parameters, BezierCurve, Point, Result, SampleMode, StrokeForgeError,
};

use crate::statistics::SearchStatistics;

/// Best candidate of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Target-class probability the selected control points scored.
    pub score: f64,
    /// Normalized control points that were rendered to obtain `score`.
    pub control_points: Vec<Point>,
    /// Grid cell (`row * grid_size + column`) of the winning candidate.
    pub winning_index: usize,
    /// Control points the winning candidate was seeded with.
    pub seed_points: Vec<Point>,
    /// 1-based step at which the selected points were scored.
    pub step: u64,
    pub statistics: SearchStatistics,
}

impl SearchResult {
    /// The winning curve in normalized coordinates.
    pub fn curve(&self, resolution: usize) -> Result<BezierCurve> {
        BezierCurve::new(self.control_points.iter().copied(), resolution)
    }

    /// Resamples the winning curve into `k` points at uniform parameters.
    ///
    /// Points are `(x, y)` in `[0, 1]²`; curve sections that bulge off the
    /// canvas are clamped onto its border.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] for `k < 2` or a resolution
    /// below 2.
    pub fn polyline(&self, k: usize, resolution: usize) -> Result<Vec<Point>> {
        if k < 2 {
            return Err(StrokeForgeError::Config(format!(
                "a polyline needs at least 2 points, got {k}"
            )));
        }
        let curve = self.curve(resolution)?;
        Ok(uniform_parameters(k)
            .into_iter()
            .map(|t| curve.sample(t, SampleMode::Direct).clamp_unit())
            .collect())
    }
}
