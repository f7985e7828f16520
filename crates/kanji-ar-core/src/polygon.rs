//! Closed polygon helpers used by quad candidate filtering.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned integer bounding box; `width`/`height` count pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingRect {
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }
}

/// Perimeter of a closed polygon.
pub fn arc_length(points: &[Point2<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let dx = (q.x - p.x) as f64;
        let dy = (q.y - p.y) as f64;
        total += (dx * dx + dy * dy).sqrt();
    }
    total
}

/// Inclusive pixel bounding box of `points`.
pub fn bounding_rect(points: &[Point2<i32>]) -> BoundingRect {
    let Some(first) = points.first() else {
        return BoundingRect::default();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    BoundingRect {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    }
}

/// Shoelace area; positive when the polygon runs clockwise in image
/// coordinates (y down).
pub fn signed_area<T>(points: &[Point2<T>]) -> f64
where
    T: Copy + Into<f64> + nalgebra::Scalar,
{
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let (ax, ay): (f64, f64) = (a.x.into(), a.y.into());
        let (bx, by): (f64, f64) = (b.x.into(), b.y.into());
        acc += ax * by - bx * ay;
    }
    0.5 * acc
}

/// Reverse `points` in place (keeping the first vertex) if it runs
/// counter-clockwise on screen.
pub fn ensure_clockwise<T>(points: &mut [Point2<T>])
where
    T: Copy + Into<f64> + nalgebra::Scalar,
{
    if signed_area(points) < 0.0 && points.len() > 2 {
        points[1..].reverse();
    }
}

fn perpendicular_distance(p: Point2<i32>, a: Point2<i32>, b: Point2<i32>) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let dx = bx - ax;
    let dy = by - ay;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    ((px - ax) * dy - (py - ay) * dx).abs() / len
}

fn rdp_open(points: &[Point2<i32>], epsilon: f64, keep: &mut [bool]) {
    // Iterative to keep deep recursion off long contours.
    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (mut max_d, mut max_i) = (0.0, start);
        for i in start + 1..end {
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > max_d {
                max_d = d;
                max_i = i;
            }
        }
        if max_d > epsilon {
            keep[max_i] = true;
            stack.push((start, max_i));
            stack.push((max_i, end));
        }
    }
}

/// Ramer-Douglas-Peucker simplification of a closed polygon.
///
/// The contour is split at its first vertex and the vertex farthest from it;
/// each half is simplified independently. Output keeps the input order.
pub fn approx_poly_dp(points: &[Point2<i32>], epsilon: f64) -> Vec<Point2<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let origin = points[0];
    let far = (1..n)
        .max_by_key(|&i| {
            let dx = (points[i].x - origin.x) as i64;
            let dy = (points[i].y - origin.y) as i64;
            dx * dx + dy * dy
        })
        .unwrap_or(n / 2);

    let mut ring = points.to_vec();
    ring.push(origin);

    let mut keep = vec![false; n + 1];
    keep[0] = true;
    keep[far] = true;
    rdp_open(&ring[..=far], epsilon, &mut keep[..=far]);
    rdp_open(&ring[far..], epsilon, &mut keep[far..]);

    ring.iter()
        .take(n)
        .zip(keep.iter())
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}
