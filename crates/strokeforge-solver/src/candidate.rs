//! Optimizable stroke state.

use strokeforge_core::Point;
use strokeforge_raster::StrokeStyle;

/// One candidate stroke of a search.
///
/// Control points are in normalized `[0, 1]²` canvas coordinates (interior
/// points may leave that square). `score` is the target-class probability
/// from the most recent step, or 0 before the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeCandidate {
    pub control_points: Vec<Point>,
    pub style: StrokeStyle,
    pub score: f64,
}

impl StrokeCandidate {
    pub fn new(control_points: Vec<Point>, style: StrokeStyle) -> Self {
        Self {
            control_points,
            style,
            score: 0.0,
        }
    }

    /// Mean of the control points.
    pub fn centroid(&self) -> Point {
        centroid(&self.control_points)
    }
}

/// Mean of `points`, or the origin for an empty slice.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ORIGIN;
    }
    let sum = points.iter().fold(Point::ORIGIN, |acc, p| acc + *p);
    sum * (1.0 / points.len() as f64)
}

/// Concatenates the candidates' control points as `x0, y0, x1, y1, ...`.
pub(crate) fn flatten(candidates: &[StrokeCandidate]) -> Vec<f64> {
    candidates
        .iter()
        .flat_map(|c| c.control_points.iter().flat_map(|p| [p.x, p.y]))
        .collect()
}

/// Writes a flat parameter vector back into the candidates.
pub(crate) fn unflatten(candidates: &mut [StrokeCandidate], params: &[f64]) {
    let mut values = params.chunks_exact(2);
    let points = candidates
        .iter_mut()
        .flat_map(|c| c.control_points.iter_mut());
    for point in points {
        if let Some(pair) = values.next() {
            *point = Point::new(pair[0], pair[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(points: &[(f64, f64)]) -> StrokeCandidate {
        StrokeCandidate::new(
            points.iter().map(|&p| Point::from(p)).collect(),
            StrokeStyle::new(1.0, 1.0),
        )
    }

    #[test]
    fn test_flatten_round_trip() {
        let mut candidates = vec![
            candidate(&[(0.125, 0.25), (0.375, 0.5)]),
            candidate(&[(0.625, 0.75)]),
        ];
        let mut flat = flatten(&candidates);
        assert_eq!(flat, vec![0.125, 0.25, 0.375, 0.5, 0.625, 0.75]);

        flat.iter_mut().for_each(|v| *v += 1.0);
        unflatten(&mut candidates, &flat);
        assert_eq!(candidates[0].control_points[1], Point::new(1.375, 1.5));
        assert_eq!(candidates[1].control_points[0], Point::new(1.625, 1.75));
    }

    #[test]
    fn test_centroid() {
        let c = candidate(&[(0.0, 0.0), (1.0, 0.5)]);
        assert_eq!(c.centroid(), Point::new(0.5, 0.25));
        assert_eq!(centroid(&[]), Point::ORIGIN);
    }
}
