//! Projection onto the feasible stroke set.
//!
//! After every optimizer step each candidate is pulled back into
//! `{arc length ≤ max_length} ∩ {first and last control point in [0, 1]²}`.
//! Interior control points stay free; they encode curvature.

use rand::Rng;
use strokeforge_core::{BezierCurve, CanvasShape, Point, Result, StrokeForgeError, TruncateSide};
use tracing::trace;

/// Relative slack on the length bound; arc lengths are table estimates.
pub const LENGTH_TOLERANCE: f64 = 1e-3;

/// Truncate/clamp rounds before falling back to a contraction.
const MAX_ROUNDS: usize = 8;

/// What a projection did to one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionOutcome {
    /// Pixel-space arc length before projection.
    pub initial_length: f64,
    /// Pixel-space arc length after projection.
    pub final_length: f64,
    /// Number of truncations applied.
    pub truncations: usize,
    /// Whether the contraction fallback ran.
    pub contracted: bool,
}

/// Projects candidates onto the length and endpoint constraints.
#[derive(Debug, Clone)]
pub struct StrokeProjection {
    shape: CanvasShape,
    max_length: f64,
    resolution: usize,
}

impl StrokeProjection {
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] for a non-positive `max_length`
    /// or a resolution below 2.
    pub fn new(shape: CanvasShape, max_length: f64, resolution: usize) -> Result<Self> {
        if !(max_length.is_finite() && max_length > 0.0) {
            return Err(StrokeForgeError::Config(format!(
                "max_length must be positive, got {max_length}"
            )));
        }
        if resolution < 2 {
            return Err(StrokeForgeError::Config(format!(
                "arc-length resolution must be at least 2, got {resolution}"
            )));
        }
        Ok(Self {
            shape,
            max_length,
            resolution,
        })
    }

    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    /// Pixel-space arc length of normalized control points.
    pub fn pixel_length(&self, points: &[Point]) -> Result<f64> {
        Ok(self.pixel_curve(points)?.arc_length())
    }

    /// Projects `points` in place.
    ///
    /// Each round clamps the endpoints and, if the curve is still too long,
    /// truncates it to `max_length / arc_length` on a side drawn from `rng`.
    /// Truncation can move an endpoint off the canvas, hence the rounds. If
    /// the rounds run out, the curve is contracted towards its first point,
    /// which scales arc length exactly and keeps both endpoints on the canvas.
    pub fn project<R: Rng + ?Sized>(
        &self,
        points: &mut [Point],
        rng: &mut R,
    ) -> Result<ProjectionOutcome> {
        let limit = self.max_length * (1.0 + LENGTH_TOLERANCE);
        clamp_endpoints(points);
        let mut curve = self.pixel_curve(points)?;
        let initial_length = curve.arc_length();
        let mut truncations = 0;

        for _ in 0..MAX_ROUNDS {
            let length = curve.arc_length();
            if length <= limit {
                break;
            }
            let side = if rng.random_bool(0.5) {
                TruncateSide::End
            } else {
                TruncateSide::Start
            };
            curve.truncate(self.max_length / length, side);
            truncations += 1;
            self.write_back(&curve, points);
            clamp_endpoints(points);
            curve = self.pixel_curve(points)?;
        }

        let mut contracted = false;
        let length = curve.arc_length();
        if length > limit {
            let scale = self.max_length / length;
            let anchor = points[0];
            for p in points.iter_mut().skip(1) {
                *p = anchor + (*p - anchor) * scale;
            }
            curve = self.pixel_curve(points)?;
            contracted = true;
        }

        let outcome = ProjectionOutcome {
            initial_length,
            final_length: curve.arc_length(),
            truncations,
            contracted,
        };
        trace!(
            initial_length = outcome.initial_length,
            final_length = outcome.final_length,
            truncations,
            contracted,
            "projected candidate"
        );
        Ok(outcome)
    }

    fn pixel_curve(&self, points: &[Point]) -> Result<BezierCurve> {
        let (sx, sy) = (self.shape.width as f64, self.shape.height as f64);
        BezierCurve::new(points.iter().map(|p| p.scale(sx, sy)), self.resolution)
    }

    fn write_back(&self, curve: &BezierCurve, points: &mut [Point]) {
        let (sx, sy) = (
            1.0 / self.shape.width as f64,
            1.0 / self.shape.height as f64,
        );
        for (p, q) in points.iter_mut().zip(curve.control_points()) {
            *p = q.scale(sx, sy);
        }
    }
}

fn clamp_endpoints(points: &mut [Point]) {
    if let Some(first) = points.first_mut() {
        *first = first.clamp_unit();
    }
    if let Some(last) = points.last_mut() {
        *last = last.clamp_unit();
    }
}
