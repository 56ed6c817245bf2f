//! Polynomial Bezier curve model.
//!
//! A [`BezierCurve`] owns its control points together with a derived
//! arc-length table: the curve is evaluated at `resolution` uniform
//! parameters, consecutive distances are accumulated, and the running sums
//! are normalized by the total. The normalized table is a piecewise-linear
//! map from arc-length fraction to curve parameter, used both for
//! arc-length-uniform sampling and for truncation.
//!
//! The table is rebuilt in full whenever the control points change.

use smallvec::SmallVec;

use crate::error::{Result, StrokeForgeError};
use crate::geometry::{bernstein, bernstein_weights, uniform_parameters, Point};

/// Control points of one curve. Four points (a cubic) fit inline.
pub type ControlPoints = SmallVec<[Point; 4]>;

/// How [`BezierCurve::sample`] maps a parameter onto the curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SampleMode {
    /// Evaluate the Bernstein sum at `t` directly.
    #[default]
    Direct,
    /// Treat `t` as an arc-length fraction and interpolate the table.
    ArcLength,
}

/// Which end of the curve [`BezierCurve::truncate`] shortens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncateSide {
    /// Keep the start of the curve, cut material off its end.
    End,
    /// Keep the end of the curve, cut material off its start.
    Start,
}

/// A degree `n - 1` Bezier curve over `n ≥ 1` control points.
///
/// # Example
///
/// ```
/// use strokeforge_core::{BezierCurve, Point, TruncateSide};
///
/// let mut curve = BezierCurve::new(
///     [Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
///     20,
/// ).unwrap();
/// assert!((curve.arc_length() - 10.0).abs() < 1e-9);
///
/// curve.truncate(0.5, TruncateSide::End);
/// assert!((curve.arc_length() - 5.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct BezierCurve {
    control_points: ControlPoints,
    resolution: usize,
    approx_ts: Vec<f64>,
    approx_points: Vec<Point>,
    cumulative_lengths: Vec<f64>,
    normalized_lengths: Vec<f64>,
}

impl BezierCurve {
    /// Builds a curve and its arc-length table.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeForgeError::Config`] for an empty control-point set or
    /// a table resolution below 2.
    pub fn new(control_points: impl IntoIterator<Item = Point>, resolution: usize) -> Result<Self> {
        let control_points: ControlPoints = control_points.into_iter().collect();
        if control_points.is_empty() {
            return Err(StrokeForgeError::Config(
                "a curve needs at least one control point".to_string(),
            ));
        }
        if resolution < 2 {
            return Err(StrokeForgeError::Config(format!(
                "arc-length resolution must be at least 2, got {resolution}"
            )));
        }

        let mut curve = Self {
            control_points,
            resolution,
            approx_ts: uniform_parameters(resolution),
            approx_points: Vec::with_capacity(resolution),
            cumulative_lengths: Vec::with_capacity(resolution),
            normalized_lengths: Vec::with_capacity(resolution),
        };
        curve.rebuild_table();
        Ok(curve)
    }

    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    pub fn into_control_points(self) -> ControlPoints {
        self.control_points
    }

    pub fn degree(&self) -> usize {
        self.control_points.len() - 1
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Exact point at parameter `t` from the Bernstein-weighted sum.
    pub fn evaluate(&self, t: f64) -> Point {
        let degree = self.degree();
        self.control_points
            .iter()
            .enumerate()
            .fold(Point::ORIGIN, |acc, (k, p)| acc + *p * bernstein(degree, k, t))
    }

    /// Samples the curve at `t` according to `mode`.
    ///
    /// Both modes return the first and last control point exactly at
    /// `t = 0` and `t = 1`.
    pub fn sample(&self, t: f64, mode: SampleMode) -> Point {
        match mode {
            SampleMode::Direct => self.evaluate(t),
            SampleMode::ArcLength => self.sample_arc_length(t),
        }
    }

    /// Weights over the control points that reproduce `sample(t, mode)`.
    ///
    /// Every sample is a fixed blend of control points: the Bernstein
    /// weights at `t` in direct mode, or the table-interpolated mix of the
    /// two bracketing Bernstein rows in arc-length mode. The arc-length
    /// blend treats the table position as constant, which is what the
    /// rasterizer's backward pass relies on.
    pub fn blend_weights(&self, t: f64, mode: SampleMode) -> SmallVec<[f64; 4]> {
        let degree = self.degree();
        match mode {
            SampleMode::Direct => bernstein_weights(degree, t),
            SampleMode::ArcLength => match self.bracket(t) {
                Bracket::First => bernstein_weights(degree, self.approx_ts[0]),
                Bracket::Last => {
                    bernstein_weights(degree, self.approx_ts[self.approx_ts.len() - 1])
                }
                Bracket::Between { left, right, t } => {
                    let lw = bernstein_weights(degree, self.approx_ts[left]);
                    let rw = bernstein_weights(degree, self.approx_ts[right]);
                    lw.iter()
                        .zip(&rw)
                        .map(|(l, r)| crate::geometry::lerp(*l, *r, t))
                        .collect()
                }
            },
        }
    }

    /// Samples `count` uniformly spaced parameters.
    pub fn sample_uniform(&self, count: usize, mode: SampleMode) -> Vec<Point> {
        uniform_parameters(count)
            .into_iter()
            .map(|t| self.sample(t, mode))
            .collect()
    }

    /// Approximate arc length: the last entry of the cumulative table.
    pub fn arc_length(&self) -> f64 {
        self.cumulative_lengths.last().copied().unwrap_or(0.0)
    }

    /// Cumulative distance table, starting at 0, one entry per table sample.
    pub fn cumulative_lengths(&self) -> &[f64] {
        &self.cumulative_lengths
    }

    /// Normalized cumulative table, spanning exactly `[0, 1]`.
    pub fn normalized_lengths(&self) -> &[f64] {
        &self.normalized_lengths
    }

    /// Returns true if the curve has no measurable length.
    pub fn is_degenerate(&self) -> bool {
        self.control_points.len() < 2 || self.arc_length() <= 0.0
    }

    /// Maps an arc-length fraction to a curve parameter through the table.
    ///
    /// Fractions outside `[0, 1]` clamp to the first or last table entry.
    pub fn parameter_at_fraction(&self, fraction: f64) -> f64 {
        match self.bracket(fraction) {
            Bracket::First => self.approx_ts[0],
            Bracket::Last => self.approx_ts[self.approx_ts.len() - 1],
            Bracket::Between { left, right, t } => {
                crate::geometry::lerp(self.approx_ts[left], self.approx_ts[right], t)
            }
        }
    }

    /// Splits at parameter `t` into the sub-curves over `[0, t]` and `[t, 1]`.
    pub fn split(&self, t: f64) -> (BezierCurve, BezierCurve) {
        let (left, right) = de_casteljau(&self.control_points, t);
        (
            self.with_same_resolution(left),
            self.with_same_resolution(right),
        )
    }

    /// Shortens the curve to `fraction` of its current arc length.
    ///
    /// The fraction is mapped to a parameter `t*` through the arc-length
    /// table and the curve is subdivided there with de Casteljau's
    /// algorithm; `side` picks which end loses material. A degenerate curve
    /// is left unchanged, as is any `fraction ≥ 1`.
    pub fn truncate(&mut self, fraction: f64, side: TruncateSide) {
        if self.is_degenerate() || fraction >= 1.0 {
            return;
        }

        let new_points = match side {
            TruncateSide::End => {
                let t = self.parameter_at_fraction(fraction);
                de_casteljau(&self.control_points, t).0
            }
            TruncateSide::Start => {
                let t = self.parameter_at_fraction(1.0 - fraction);
                de_casteljau(&self.control_points, t).1
            }
        };

        self.control_points = new_points;
        self.rebuild_table();
    }

    fn with_same_resolution(&self, control_points: ControlPoints) -> BezierCurve {
        let mut curve = BezierCurve {
            control_points,
            resolution: self.resolution,
            approx_ts: self.approx_ts.clone(),
            approx_points: Vec::with_capacity(self.resolution),
            cumulative_lengths: Vec::with_capacity(self.resolution),
            normalized_lengths: Vec::with_capacity(self.resolution),
        };
        curve.rebuild_table();
        curve
    }

    fn rebuild_table(&mut self) {
        self.approx_points.clear();
        self.cumulative_lengths.clear();
        self.normalized_lengths.clear();

        for i in 0..self.approx_ts.len() {
            let point = self.evaluate(self.approx_ts[i]);
            self.approx_points.push(point);
        }

        let mut total = 0.0;
        self.cumulative_lengths.push(0.0);
        for pair in self.approx_points.windows(2) {
            total += pair[0].distance(pair[1]);
            self.cumulative_lengths.push(total);
        }

        if total > 0.0 {
            self.normalized_lengths
                .extend(self.cumulative_lengths.iter().map(|d| d / total));
            // Division can leave the last entry a hair under 1.
            if let Some(last) = self.normalized_lengths.last_mut() {
                *last = 1.0;
            }
        } else {
            // No length to normalize by; the parameter table keeps the map monotone.
            self.normalized_lengths.extend_from_slice(&self.approx_ts);
        }
    }

    fn sample_arc_length(&self, fraction: f64) -> Point {
        match self.bracket(fraction) {
            Bracket::First => self.approx_points[0],
            Bracket::Last => self.approx_points[self.approx_points.len() - 1],
            Bracket::Between { left, right, t } => {
                if t <= 0.0 {
                    self.approx_points[left]
                } else if t >= 1.0 {
                    self.approx_points[right]
                } else {
                    self.approx_points[left].lerp(self.approx_points[right], t)
                }
            }
        }
    }

    /// Locates the table segment containing `fraction`.
    fn bracket(&self, fraction: f64) -> Bracket {
        let table = &self.normalized_lengths;
        let right = table.partition_point(|v| *v <= fraction);
        if right == 0 {
            return Bracket::First;
        }
        if right >= table.len() {
            return Bracket::Last;
        }

        let left = right - 1;
        let span = table[right] - table[left];
        let t = if span > 0.0 {
            (fraction - table[left]) / span
        } else {
            0.0
        };
        Bracket::Between { left, right, t }
    }
}

#[derive(Debug, Clone, Copy)]
enum Bracket {
    First,
    Last,
    Between { left: usize, right: usize, t: f64 },
}

/// De Casteljau subdivision at `t`.
///
/// Builds the triangular array `Q⁰ = points`, `Qᵏᵢ = lerp(Qᵏ⁻¹ᵢ, Qᵏ⁻¹ᵢ₊₁, t)`
/// and returns `([Q⁰₀, Q¹₀, …, Qⁿ⁻¹₀], [Qⁿ⁻¹₀, Qⁿ⁻²₁, …, Q⁰ₙ₋₁])`, the control
/// points of the sub-curves over `[0, t]` and `[t, 1]`.
pub fn de_casteljau(points: &[Point], t: f64) -> (ControlPoints, ControlPoints) {
    let n = points.len();
    let mut row: ControlPoints = points.iter().copied().collect();
    let mut left = ControlPoints::with_capacity(n);
    let mut right = ControlPoints::with_capacity(n);

    for level in 0..n {
        left.push(row[0]);
        right.push(row[n - 1 - level]);
        for i in 0..row.len().saturating_sub(1) {
            row[i] = row[i].lerp(row[i + 1], t);
        }
        row.pop();
    }

    right.reverse();
    (left, right)
}
