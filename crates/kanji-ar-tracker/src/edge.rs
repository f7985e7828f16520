//! Sub-pixel corner refinement from intensity strips across the quad edges.
//!
//! For every edge of a clockwise quad a handful of strips are sampled
//! perpendicular to the edge. A Sobel response along each strip locates the
//! edge; a parabola through the peak gives the sub-pixel offset. A line is
//! fitted per edge and adjacent lines are intersected to get the corners.

use kanji_ar_core::{fit_line, sample_bilinear_or, GrayImageView, Line2};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::params::EdgeRefineParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RefineError {
    #[error("fitted lines of edges {first} and {second} are parallel")]
    DegenerateGeometry { first: usize, second: usize },
    #[error("edge {edge} produced {found} refined points, need at least 2")]
    InsufficientEdgePoints { edge: usize, found: usize },
}

/// Sampling frame for one edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStrip {
    /// Unit vector along the edge.
    pub direction: Vector2<f64>,
    /// Unit vector perpendicular to the edge; outward for clockwise quads.
    pub normal: Vector2<f64>,
    /// Number of samples across the edge; always odd and at least 5.
    pub len: usize,
}

impl EdgeStrip {
    /// Strip for a segment vector `step` (edge vector divided by the number
    /// of segments).
    pub fn new(step: Vector2<f64>, params: &EdgeRefineParams) -> Option<Self> {
        let d = step.norm();
        if d <= 0.0 || !d.is_finite() {
            return None;
        }
        let direction = step / d;
        Some(Self {
            direction,
            normal: Vector2::new(direction.y, -direction.x),
            len: strip_length(d, params),
        })
    }

    #[inline]
    pub fn half(&self) -> usize {
        self.len >> 1
    }
}

/// `max(min_len, trunc(scale * d))`, then forced odd.
pub fn strip_length(d: f64, params: &EdgeRefineParams) -> usize {
    let raw = (params.strip_scale * d).max(0.0) as usize;
    raw.max(params.min_strip_len).max(5) | 1
}

/// Per-edge intermediate results, kept for diagnostics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EdgeTrace {
    /// Strip centers on the coarse edge.
    pub samples: Vec<Point2<f64>>,
    /// Sub-pixel edge locations.
    pub points: Vec<Point2<f64>>,
    pub line: Option<Line2>,
}

/// Refined quad corners plus the per-edge traces.
#[derive(Clone, Debug)]
pub struct RefinedQuad {
    /// Corner `i` refines input corner `i`.
    pub corners: [Point2<f64>; 4],
    pub edges: [EdgeTrace; 4],
}

/// Stateless corner refiner.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeRefiner {
    params: EdgeRefineParams,
}

impl EdgeRefiner {
    pub fn new(params: EdgeRefineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EdgeRefineParams {
        &self.params
    }

    /// Refine the corners of a clockwise `quad` against `gray`.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn refine(
        &self,
        quad: &[Point2<f64>; 4],
        gray: &GrayImageView<'_>,
    ) -> Result<RefinedQuad, RefineError> {
        let mut edges: [EdgeTrace; 4] = Default::default();
        let mut lines = [None; 4];

        for i in 0..4 {
            let trace = self.trace_edge(quad[i], quad[(i + 1) % 4], gray);
            if trace.points.len() < 2 {
                return Err(RefineError::InsufficientEdgePoints {
                    edge: i,
                    found: trace.points.len(),
                });
            }
            let line = fit_line(&trace.points).ok_or(RefineError::InsufficientEdgePoints {
                edge: i,
                found: trace.points.len(),
            })?;
            lines[i] = Some(line);
            edges[i] = EdgeTrace {
                line: Some(line),
                ..trace
            };
        }

        let mut corners = [Point2::origin(); 4];
        for (i, corner) in corners.iter_mut().enumerate() {
            let prev = (i + 3) % 4;
            let (Some(a), Some(b)) = (lines[prev], lines[i]) else {
                return Err(RefineError::DegenerateGeometry {
                    first: prev,
                    second: i,
                });
            };
            *corner = a
                .intersect_with_eps(&b, self.params.parallel_eps)
                .ok_or(RefineError::DegenerateGeometry {
                    first: prev,
                    second: i,
                })?;
        }

        Ok(RefinedQuad { corners, edges })
    }

    fn trace_edge(&self, a: Point2<f64>, b: Point2<f64>, gray: &GrayImageView<'_>) -> EdgeTrace {
        let segments = self.params.segments.max(2);
        let step = (b - a) / segments as f64;
        let mut trace = EdgeTrace::default();
        let Some(strip) = EdgeStrip::new(step, &self.params) else {
            return trace;
        };

        let mut samples = vec![0.0; 3 * strip.len];
        let mut sobel = vec![0.0; strip.len - 2];
        for j in 1..segments {
            let p = a + step * j as f64;
            trace.samples.push(p);
            self.sample_strip(gray, p, &strip, &mut samples);
            if let Some(offset) = self.locate_edge(&samples, &strip, &mut sobel) {
                trace.points.push(p + strip.normal * offset);
            }
        }
        trace
    }

    // Row-major `len x 3`: row = position across the edge (inside to
    // outside), column = position along the edge.
    fn sample_strip(
        &self,
        gray: &GrayImageView<'_>,
        center: Point2<f64>,
        strip: &EdgeStrip,
        out: &mut [f64],
    ) {
        let half = strip.half() as isize;
        for (row, n) in (-half..=half).enumerate() {
            for (col, m) in (-1isize..=1).enumerate() {
                let q = center + strip.direction * m as f64 + strip.normal * n as f64;
                out[row * 3 + col] =
                    sample_bilinear_or(gray, q.x, q.y, self.params.fallback_intensity);
            }
        }
    }

    /// Signed offset of the edge from the strip center along the normal.
    fn locate_edge(&self, samples: &[f64], strip: &EdgeStrip, sobel: &mut [f64]) -> Option<f64> {
        let row = |r: usize| samples[r * 3] + 2.0 * samples[r * 3 + 1] + samples[r * 3 + 2];
        for (k, v) in sobel.iter_mut().enumerate() {
            *v = self.params.polarity.response(row(k + 2) - row(k));
        }

        let mut best = 0usize;
        for (k, &v) in sobel.iter().enumerate() {
            if v > sobel[best] {
                best = k;
            }
        }
        let y1 = sobel[best];
        if y1 <= 0.0 {
            return None;
        }
        let y0 = if best == 0 { 0.0 } else { sobel[best - 1] };
        let y2 = if best + 1 >= sobel.len() {
            0.0
        } else {
            sobel[best + 1]
        };
        let pos = (y2 - y0) / (4.0 * y1 - 2.0 * y0 - 2.0 * y2);
        if !pos.is_finite() {
            return None;
        }
        // Sobel index k is centered on strip row k + 1.
        let shift = (best + 1) as f64 - strip.half() as f64;
        Some(shift + pos)
    }
}
