//! 2D line kernel: total least squares fitting and Cramer's-rule intersection.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Cross products of unit directions below this are treated as parallel.
pub const PARALLEL_EPS: f64 = 1e-3;

/// Infinite line `point + s * direction` with a unit `direction`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line2 {
    pub point: Point2<f64>,
    pub direction: Vector2<f64>,
}

impl Line2 {
    /// Build a line from a point and any non-zero direction.
    pub fn new(point: Point2<f64>, direction: Vector2<f64>) -> Option<Self> {
        let n = direction.norm();
        if n <= 0.0 || !n.is_finite() {
            return None;
        }
        Some(Self {
            point,
            direction: direction / n,
        })
    }

    pub fn through(a: Point2<f64>, b: Point2<f64>) -> Option<Self> {
        Self::new(a, b - a)
    }

    /// Point at signed distance `s` along the direction.
    #[inline]
    pub fn at(&self, s: f64) -> Point2<f64> {
        self.point + self.direction * s
    }

    /// Unsigned orthogonal distance from `p` to the line.
    pub fn distance(&self, p: Point2<f64>) -> f64 {
        let d = p - self.point;
        (d.x * self.direction.y - d.y * self.direction.x).abs()
    }

    /// Intersect two lines with Cramer's rule.
    ///
    /// Returns `None` when `|u0 x u1| < eps` (numerically parallel).
    pub fn intersect_with_eps(&self, other: &Line2, eps: f64) -> Option<Point2<f64>> {
        let (x0, y0) = (self.point.x, self.point.y);
        let (x1, y1) = (other.point.x, other.point.y);
        let (u0, v0) = (self.direction.x, self.direction.y);
        let (u1, v1) = (other.direction.x, other.direction.y);

        let det = v1 * u0 - v0 * u1;
        if det.abs() < eps || !det.is_finite() {
            return None;
        }

        let a = x1 * u0 * v1 - y1 * u0 * u1 - x0 * u1 * v0 + y0 * u0 * u1;
        let b = -x0 * v0 * v1 + y0 * u0 * v1 + x1 * v0 * v1 - y1 * v0 * u1;
        Some(Point2::new(a / det, b / det))
    }

    #[inline]
    pub fn intersect(&self, other: &Line2) -> Option<Point2<f64>> {
        self.intersect_with_eps(other, PARALLEL_EPS)
    }
}

/// Least-squares (orthogonal distance) line through `points`.
///
/// The line passes through the centroid along the principal axis of the
/// scatter. Needs at least two distinct points.
pub fn fit_line(points: &[Point2<f64>]) -> Option<Line2> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p.x - cx;
        let dy = p.y - cy;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx + syy <= 0.0 {
        return None;
    }

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (sin_t, cos_t) = theta.sin_cos();
    Line2::new(Point2::new(cx, cy), Vector2::new(cos_t, sin_t))
}
