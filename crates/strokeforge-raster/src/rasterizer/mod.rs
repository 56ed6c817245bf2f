//! Batched curve rasterizer with an analytic backward pass.

use rayon::prelude::*;
use smallvec::SmallVec;
use strokeforge_core::{
    uniform_parameters, BezierCurve, CanvasShape, Point, Result, SampleMode, StrokeForgeError,
};
use tracing::trace;

/// Offset added to the normalized distance before exponentiation.
///
/// `0^a` has an unbounded derivative for `a < 1`; the offset keeps the
/// intensity and its gradient finite at the stroke's centre line.
pub const EPSILON: f64 = 0.000001;

/// Width and anti-aliasing exponent for one rendered stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Distance (in pixels) at which intensity reaches zero.
    pub width: f64,
    /// Fall-off exponent; small values render soft, large values sharp.
    pub aa_factor: f64,
}

impl StrokeStyle {
    pub fn new(width: f64, aa_factor: f64) -> Self {
        Self { width, aa_factor }
    }

    fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(StrokeForgeError::Config(format!(
                "stroke width must be positive, got {}",
                self.width
            )));
        }
        if !(self.aa_factor.is_finite() && self.aa_factor > 0.0) {
            return Err(StrokeForgeError::Config(format!(
                "anti-aliasing factor must be positive, got {}",
                self.aa_factor
            )));
        }
        Ok(())
    }

    /// Intensity at pixel distance `d`.
    #[inline]
    pub fn intensity(&self, d: f64) -> f64 {
        let u = d / self.width + EPSILON;
        (1.0 - u.powf(self.aa_factor)).clamp(0.0, 1.0)
    }
}

/// One rendered candidate plus what the backward pass needs.
#[derive(Debug, Clone)]
pub struct RenderedStroke {
    style: StrokeStyle,
    intensity: Vec<f64>,
    distances: Vec<f64>,
    nearest: Vec<u32>,
    samples: Vec<Point>,
    weights: Vec<SmallVec<[f64; 4]>>,
}

impl RenderedStroke {
    /// Row-major intensities in `[0, 1]`.
    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    /// Distance from each pixel to its nearest sample point.
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Sample points in pixel space.
    pub fn samples(&self) -> &[Point] {
        &self.samples
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn into_intensity(self) -> Vec<f64> {
        self.intensity
    }
}

/// Output of [`CurveRasterizer::render`].
#[derive(Debug, Clone)]
pub struct RenderedBatch {
    shape: CanvasShape,
    strokes: Vec<RenderedStroke>,
}

impl RenderedBatch {
    pub fn shape(&self) -> CanvasShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn strokes(&self) -> &[RenderedStroke] {
        &self.strokes
    }

    pub fn stroke(&self, index: usize) -> &RenderedStroke {
        &self.strokes[index]
    }
}

/// Gradient of a scalar objective w.r.t. one stroke's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeGradient {
    /// One entry per control point, in normalized coordinates.
    pub control_points: Vec<Point>,
    pub width: f64,
    pub aa_factor: f64,
}

/// Turns batches of normalized control-point sets into intensity fields.
///
/// # Example
///
/// ```
/// use strokeforge_core::{CanvasShape, Point};
/// use strokeforge_raster::{CurveRasterizer, StrokeStyle};
///
/// let rasterizer = CurveRasterizer::new(CanvasShape::square(20), 15).unwrap();
/// let line = vec![Point::new(0.2, 0.5), Point::new(0.8, 0.5)];
/// let batch = rasterizer.render(&[line], &[StrokeStyle::new(2.0, 1.0)]).unwrap();
///
/// let ink = batch.stroke(0).intensity();
/// assert!(ink[10 * 20 + 10] > 0.9); // on the line
/// assert_eq!(ink[0], 0.0);          // far corner
/// ```
#[derive(Debug, Clone)]
pub struct CurveRasterizer {
    shape: CanvasShape,
    sample_count: usize,
    sample_mode: SampleMode,
    resolution: usize,
    parameters: Vec<f64>,
}

impl CurveRasterizer {
    /// Creates a rasterizer sampling each curve at `sample_count` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] for an empty canvas or fewer than
    /// 3 samples.
    pub fn new(shape: CanvasShape, sample_count: usize) -> Result<Self> {
        if shape.is_empty() {
            return Err(StrokeForgeError::Config(
                "canvas shape must be non-empty".to_string(),
            ));
        }
        if sample_count < 3 {
            return Err(StrokeForgeError::Config(format!(
                "sample count must be at least 3, got {sample_count}"
            )));
        }
        Ok(Self {
            shape,
            sample_count,
            sample_mode: SampleMode::Direct,
            resolution: sample_count,
            parameters: uniform_parameters(sample_count),
        })
    }

    /// Samples curves uniformly in arc length instead of parameter.
    pub fn with_sample_mode(mut self, mode: SampleMode) -> Self {
        self.sample_mode = mode;
        self
    }

    /// Resolution of the arc-length table used in [`SampleMode::ArcLength`].
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] for a resolution below 2.
    pub fn with_resolution(mut self, resolution: usize) -> Result<Self> {
        if resolution < 2 {
            return Err(StrokeForgeError::Config(format!(
                "arc-length resolution must be at least 2, got {resolution}"
            )));
        }
        self.resolution = resolution;
        Ok(self)
    }

    pub fn shape(&self) -> CanvasShape {
        self.shape
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn sample_mode(&self) -> SampleMode {
        self.sample_mode
    }

    /// Renders one stroke per control-point set.
    ///
    /// Candidates are independent and rendered in parallel; the result for
    /// each candidate is identical to rendering it alone.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] for an empty control-point set
    /// or a non-positive width / anti-aliasing factor, and
    /// [`StrokeForgeError::InvalidInput`] if the slices differ in length.
    pub fn render<P>(&self, control_points: &[P], styles: &[StrokeStyle]) -> Result<RenderedBatch>
    where
        P: AsRef<[Point]> + Sync,
    {
        if control_points.len() != styles.len() {
            return Err(StrokeForgeError::InvalidInput(format!(
                "{} control-point sets for {} styles",
                control_points.len(),
                styles.len()
            )));
        }
        for (points, style) in control_points.iter().zip(styles) {
            if points.as_ref().is_empty() {
                return Err(StrokeForgeError::Config(
                    "a stroke needs at least one control point".to_string(),
                ));
            }
            style.validate()?;
        }

        let strokes = control_points
            .par_iter()
            .zip(styles.par_iter())
            .map(|(points, style)| self.render_one(points.as_ref(), *style))
            .collect::<Result<Vec<_>>>()?;

        trace!(candidates = strokes.len(), "rendered batch");
        Ok(RenderedBatch {
            shape: self.shape,
            strokes,
        })
    }

    /// Back-propagates per-pixel intensity gradients to stroke parameters.
    ///
    /// `intensity_gradients[i][p]` is `∂L/∂I` for candidate `i` at pixel `p`.
    /// Pixels whose intensity is clamped contribute nothing; each pixel's
    /// distance gradient flows only into its nearest sample.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::InvalidInput`] if the gradient layout does
    /// not match the batch.
    pub fn backward(
        &self,
        batch: &RenderedBatch,
        intensity_gradients: &[Vec<f64>],
    ) -> Result<Vec<StrokeGradient>> {
        let pixels = batch.shape.pixel_count();
        if intensity_gradients.len() != batch.len()
            || intensity_gradients.iter().any(|g| g.len() != pixels)
        {
            return Err(StrokeForgeError::InvalidInput(
                "intensity gradients do not match the rendered batch".to_string(),
            ));
        }

        Ok(batch
            .strokes
            .par_iter()
            .zip(intensity_gradients.par_iter())
            .map(|(stroke, grad)| self.backward_one(stroke, grad))
            .collect())
    }

    fn render_one(&self, control_points: &[Point], style: StrokeStyle) -> Result<RenderedStroke> {
        let (sx, sy) = (self.shape.width as f64, self.shape.height as f64);
        let curve = BezierCurve::new(
            control_points.iter().map(|p| p.scale(sx, sy)),
            self.resolution,
        )?;

        let weights: Vec<SmallVec<[f64; 4]>> = self
            .parameters
            .iter()
            .map(|&t| curve.blend_weights(t, self.sample_mode))
            .collect();
        let samples: Vec<Point> = weights
            .iter()
            .map(|w| {
                curve
                    .control_points()
                    .iter()
                    .zip(w)
                    .fold(Point::ORIGIN, |acc, (p, w)| acc + *p * *w)
            })
            .collect();

        let (distances, nearest) = self.distance_field(&samples);
        let intensity = distances.iter().map(|&d| style.intensity(d)).collect();

        Ok(RenderedStroke {
            style,
            intensity,
            distances,
            nearest,
            samples,
            weights,
        })
    }

    /// Minimum distance from every pixel to any sample point.
    ///
    /// Rows are independent. Within a row each sample is folded into the
    /// running `dist²` and `nearest` buffers in one sweep; ties keep the
    /// lowest sample index.
    fn distance_field(&self, samples: &[Point]) -> (Vec<f64>, Vec<u32>) {
        let width = self.shape.width;
        let mut distances = vec![f64::INFINITY; self.shape.pixel_count()];
        let mut nearest = vec![0u32; self.shape.pixel_count()];
        let columns: Vec<f64> = (0..width).map(|x| x as f64).collect();

        distances
            .par_chunks_mut(width)
            .zip(nearest.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, (dist_row, near_row))| {
                let yf = y as f64;
                for (m, s) in samples.iter().enumerate() {
                    let dy2 = (yf - s.y) * (yf - s.y);
                    for ((d2, near), x) in
                        dist_row.iter_mut().zip(near_row.iter_mut()).zip(&columns)
                    {
                        let candidate = (x - s.x) * (x - s.x) + dy2;
                        if candidate < *d2 {
                            *d2 = candidate;
                            *near = m as u32;
                        }
                    }
                }
                for d2 in dist_row.iter_mut() {
                    *d2 = d2.sqrt();
                }
            });

        (distances, nearest)
    }

    fn backward_one(&self, stroke: &RenderedStroke, grad: &[f64]) -> StrokeGradient {
        let StrokeStyle { width, aa_factor } = stroke.style;
        let mut sample_grads = vec![Point::ORIGIN; stroke.samples.len()];
        let mut grad_width = 0.0;
        let mut grad_aa = 0.0;

        for (i, &g) in grad.iter().enumerate() {
            if g == 0.0 {
                continue;
            }
            let d = stroke.distances[i];
            let u = d / width + EPSILON;
            let ua = u.powf(aa_factor);
            let raw = 1.0 - ua;
            if !(raw > 0.0 && raw < 1.0) {
                continue;
            }

            // I = 1 - u^a, u = d / w + ε
            let di_du = -aa_factor * ua / u;
            grad_width += g * di_du * (-d / (width * width));
            grad_aa += g * (-ua * u.ln());

            if d > 0.0 {
                let m = stroke.nearest[i] as usize;
                let pixel = Point::new(
                    (i % self.shape.width) as f64,
                    (i / self.shape.width) as f64,
                );
                let direction = (stroke.samples[m] - pixel) * (1.0 / d);
                sample_grads[m] += direction * (g * di_du / width);
            }
        }

        let control_count = stroke.weights.first().map_or(0, |w| w.len());
        let (sx, sy) = (self.shape.width as f64, self.shape.height as f64);
        let control_points = (0..control_count)
            .map(|j| {
                let pixel_grad = stroke
                    .weights
                    .iter()
                    .zip(&sample_grads)
                    .fold(Point::ORIGIN, |acc, (w, g)| acc + *g * w[j]);
                // Control points were scaled into pixel space by (width, height).
                pixel_grad.scale(sx, sy)
            })
            .collect();

        StrokeGradient {
            control_points,
            width: grad_width,
            aa_factor: grad_aa,
        }
    }
}
