//! Points and the scalar helpers used for Bezier blending.

use std::ops::{Add, AddAssign, Mul, Sub};

use smallvec::SmallVec;

/// A 2D point.
///
/// `x` runs along canvas columns, `y` along canvas rows. Control points
/// handed across the public API are normalized to `[0, 1]²`; the
/// rasterizer scales them into pixel space internally.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    /// Length of the vector from the origin to this point.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Linear interpolation towards `other`; `t = 0` returns `self` exactly.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(lerp(self.x, other.x, t), lerp(self.y, other.y, t))
    }

    /// Scales each axis independently.
    pub fn scale(self, sx: f64, sy: f64) -> Point {
        Point::new(self.x * sx, self.y * sy)
    }

    /// Clamps both coordinates into `[0, 1]`.
    pub fn clamp_unit(self) -> Point {
        Point::new(self.x.clamp(0.0, 1.0), self.y.clamp(0.0, 1.0))
    }

    /// Returns true if both coordinates lie in `[0, 1]`.
    pub fn is_in_unit_square(self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Scalar linear interpolation.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Binomial coefficient `n choose k` as a float.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result
}

/// Bernstein basis polynomial `b_{k,n}(t) = C(n,k) t^k (1-t)^(n-k)`.
///
/// `powi(0)` is exactly 1, so the endpoint weights are exact at `t = 0`
/// and `t = 1`.
#[inline]
pub fn bernstein(degree: usize, k: usize, t: f64) -> f64 {
    binomial(degree, k) * t.powi(k as i32) * (1.0 - t).powi((degree - k) as i32)
}

/// All Bernstein weights of the given degree at `t`.
pub fn bernstein_weights(degree: usize, t: f64) -> SmallVec<[f64; 4]> {
    (0..=degree).map(|k| bernstein(degree, k, t)).collect()
}

/// `count` parameters evenly spaced over `[0, 1]`, both ends included.
pub fn uniform_parameters(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = (count - 1) as f64;
            (0..count).map(|i| i as f64 / last).collect()
        }
    }
}
